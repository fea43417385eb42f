//! Benchmark subsystem end-to-end: dataset fixtures on disk, parser
//! dispatch, pairing, and the Solomon/vrplib unit guarantees.

use std::path::Path;

use fleetroute::instance::index::{DatasetIndex, ListQuery};
use fleetroute::instance::{load_instance, solution, vrplib};

const SOLOMON_C101: &str = "C101\n\n\
VEHICLE\n\
NUMBER     CAPACITY\n\
  25         200\n\n\
CUSTOMER\n\
CUST NO.  XCOORD.   YCOORD.    DEMAND   READY TIME  DUE DATE   SERVICE TIME\n\n\
    0      40         50          0          0       1236          0\n\
    1      45         68         10        912        967         90\n\
    2      45         70         30        825        870         90\n\
    3      42         66         10         65        146         90\n";

const VRP_TOY: &str = "NAME : toy4\n\
TYPE : CVRP\n\
DIMENSION : 4\n\
EDGE_WEIGHT_TYPE : EUC_2D\n\
CAPACITY : 30\n\
NODE_COORD_SECTION\n\
1 0 0\n\
2 10 0\n\
3 0 10\n\
4 10 10\n\
DEMAND_SECTION\n\
1 0\n\
2 10\n\
3 10\n\
4 10\n\
DEPOT_SECTION\n\
1\n\
-1\n\
EOF\n";

const XML_TOY: &str = r#"<instance>
    <fleet vehicles="2" capacity="50"/>
    <nodes>
        <node id="1" x="0" y="0" type="depot"/>
        <node id="2" x="30" y="40" demand="20"/>
    </nodes>
</instance>"#;

const SOL_C101: &str = "Route #1: 1 3\nRoute #2: 2\nCost 190.6\n";

fn fixture() -> (tempfile::TempDir, DatasetIndex) {
    let dir = tempfile::tempdir().unwrap();
    let solomon = dir.path().join("solomon");
    std::fs::create_dir_all(&solomon).unwrap();
    std::fs::write(solomon.join("c101.txt"), SOLOMON_C101).unwrap();
    std::fs::write(solomon.join("c101.sol"), SOL_C101).unwrap();
    std::fs::write(solomon.join("r101.vrp"), VRP_TOY).unwrap();

    let xml = dir.path().join("xml100");
    std::fs::create_dir_all(&xml).unwrap();
    std::fs::write(xml.join("toy.xml"), XML_TOY).unwrap();

    let index = DatasetIndex::new(dir.path().to_path_buf(), vec!["custom_data".to_string()]);
    (dir, index)
}

#[test]
fn every_solomon_time_field_is_the_file_value_times_sixty() {
    let (dir, _) = fixture();
    let path = dir.path().join("solomon/c101.txt");
    let instance = load_instance(&path, false).unwrap();

    let file_minutes: Vec<(i64, i64, i64)> = vec![
        (0, 1236, 0),
        (912, 967, 90),
        (825, 870, 90),
        (65, 146, 90),
    ];
    for (i, &(ready, due, service)) in file_minutes.iter().enumerate() {
        let wp = &instance.waypoints[i];
        let tw = wp.time_window.unwrap();
        if i == 0 {
            // Depot window widened to the full horizon, still ×60.
            assert_eq!(tw.end, 1236 * 60);
        } else {
            assert_eq!(tw.start, ready * 60, "node {i} ready");
            assert_eq!(tw.end, due * 60, "node {i} due");
        }
        assert_eq!(wp.service_time, service * 60, "node {i} service");
    }
    assert_eq!(instance.meta.capacity, 200);
    assert_eq!(instance.fleet.vehicles.len(), 25);
}

#[test]
fn extension_sniffing_routes_each_format_to_its_parser() {
    let (dir, _) = fixture();

    // .txt with a VEHICLE/CUSTOMER block is Solomon.
    let solomon = load_instance(&dir.path().join("solomon/c101.txt"), false).unwrap();
    assert_eq!(solomon.meta.format, "solomon");

    // .vrp with keyed sections is cvrplib.
    let cvrplib = load_instance(&dir.path().join("solomon/r101.vrp"), true).unwrap();
    assert_eq!(cvrplib.meta.format, "cvrplib");
    let matrix = cvrplib.matrix.unwrap();
    assert_eq!(matrix.distances[0][1], 10.0);
    for i in 0..4 {
        assert_eq!(matrix.distances[i][i], 0.0);
    }

    // .xml goes through tolerant tag discovery.
    let xml = load_instance(&dir.path().join("xml100/toy.xml"), true).unwrap();
    assert_eq!(xml.meta.format, "vrp-set-xml");
    assert_eq!(xml.matrix.unwrap().distances[0][1], 50.0);
}

#[test]
fn missing_file_is_not_found() {
    let (dir, _) = fixture();
    let err = load_instance(&dir.path().join("solomon/ghost.vrp"), false).unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn vrplib_round_trip_preserves_the_instance() {
    let (dir, _) = fixture();
    let original = load_instance(&dir.path().join("solomon/r101.vrp"), false).unwrap();

    let rewritten = vrplib::write(&original, "toy4");
    let reparsed = vrplib::parse(&rewritten, false).unwrap();

    assert_eq!(reparsed.waypoints.len(), original.waypoints.len());
    assert_eq!(reparsed.depot_index, original.depot_index);
    assert_eq!(reparsed.meta.capacity, original.meta.capacity);
    for (a, b) in original.waypoints.iter().zip(reparsed.waypoints.iter()) {
        assert_eq!(a.solver_xy(), b.solver_xy());
        assert_eq!(a.scalar_demand(), b.scalar_demand());
        assert_eq!(a.depot, b.depot);
    }
}

#[test]
fn find_pair_matches_stems_with_or_without_extension() {
    let (_dir, index) = fixture();

    let bare = index.find_pair("solomon", "c101").unwrap();
    let with_ext = index.find_pair("solomon", "c101.vrp").unwrap();
    assert_eq!(
        bare.instance.as_ref().map(|f| f.entry.name.clone()),
        with_ext.instance.as_ref().map(|f| f.entry.name.clone()),
    );
    assert!(bare.instance.is_some());
    assert!(bare.solution.is_some());
    assert_eq!(bare.solution.unwrap().entry.name, "c101.sol");

    // r101 has an instance but no solution.
    let solo = index.find_pair("solomon", "r101").unwrap();
    assert!(solo.instance.is_some());
    assert!(solo.solution.is_none());

    // Case-insensitive dataset and stem.
    let upper = index.find_pair("SOLOMON", "C101").unwrap();
    assert!(upper.instance.is_some());
}

#[test]
fn listing_filters_by_kind_and_extension() {
    let (_dir, index) = fixture();

    let everything = index.list_files("solomon", &ListQuery::default()).unwrap();
    assert_eq!(everything.total, 3);

    let instances = index
        .list_files(
            "solomon",
            &ListQuery {
                kind: Some("instances".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(instances.total, 2);

    let vrp_only = index
        .list_files(
            "solomon",
            &ListQuery {
                exts: Some(vec![".vrp".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(vrp_only.total, 1);
    assert_eq!(vrp_only.items[0].name, "r101.vrp");
}

#[test]
fn solution_files_pair_with_their_instances() {
    let (dir, index) = fixture();
    let pair = index.find_pair("solomon", "c101").unwrap();
    let sol_path = pair.solution.unwrap().entry.abspath;

    let parsed = solution::parse(&std::fs::read_to_string(Path::new(&sol_path)).unwrap()).unwrap();
    assert_eq!(parsed.routes.len(), 2);
    assert_eq!(parsed.routes[0].nodes, vec![0, 2, 4, 0]);
    assert_eq!(parsed.objective, Some(190.6));

    drop(dir);
}

#[test]
fn datasets_exclude_the_blacklist() {
    let (dir, index) = fixture();
    std::fs::create_dir_all(dir.path().join("custom_data")).unwrap();

    let names: Vec<String> = index.list_datasets().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["solomon".to_string(), "xml100".to_string()]);
}
