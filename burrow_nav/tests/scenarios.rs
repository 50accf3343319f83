// End-to-end scenarios driving the public `NavWorld` API: the tile edit
// pipeline, reachability queries, and asynchronous path delivery.

use burrow_nav::event::NavEventKind;
use burrow_nav::{NavConfig, NavWorld, ObjectKind, Path, Terrain, TileCoord, TileMap};
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn world_from(art: &str) -> NavWorld {
    let world = NavWorld::new(NavConfig::default(), TileMap::from_ascii(art).unwrap()).unwrap();
    world.verify().unwrap();
    world
}

/// Request a path and tick until it arrives.
fn find_path(world: &mut NavWorld, start: TileCoord, end: TileCoord, exclude_start: bool) -> Path {
    let slot: Arc<Mutex<Option<Path>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&slot);
    world.request_path(start, end, exclude_start, move |path| {
        *sink.lock().unwrap() = Some(path);
    });
    for _ in 0..10_000 {
        if let Some(path) = slot.lock().unwrap().take() {
            return path;
        }
        world.tick();
        thread::sleep(Duration::from_millis(1));
    }
    panic!("path {start} -> {end} never arrived");
}

/// Ground truth: tiles connected through the node graph.
fn graph_connected(world: &NavWorld, a: TileCoord, b: TileCoord) -> bool {
    let graph = world.graph();
    let (Some(start), Some(goal)) = (graph.node_id(a), graph.node_id(b)) else {
        return false;
    };
    if !graph.node(start).pathable || !graph.node(goal).pathable {
        return false;
    }
    let mut seen = BTreeSet::from([start]);
    let mut frontier = VecDeque::from([start]);
    while let Some(n) = frontier.pop_front() {
        if n == goal {
            return true;
        }
        for &next in graph.node(n).neighbors() {
            if seen.insert(next) {
                frontier.push_back(next);
            }
        }
    }
    false
}

#[test]
fn open_grid_reachability_and_diagonal_route() {
    let mut world = NavWorld::new(NavConfig::default(), TileMap::new(10, 10)).unwrap();
    let tiles: Vec<TileCoord> = (0..10)
        .flat_map(|x| (0..10).map(move |y| TileCoord::new(x, y)))
        .collect();
    for &a in &tiles {
        for &b in &tiles {
            assert!(world.can_reach_tiles(a, b), "{a} cannot reach {b}");
        }
    }

    let path = find_path(&mut world, TileCoord::new(0, 0), TileCoord::new(9, 9), false);
    assert!(path.is_valid());
    assert_eq!(path.len(), 10);
    let diagonal_steps = path
        .tiles()
        .windows(2)
        .filter(|w| w[0].x != w[1].x && w[0].y != w[1].y)
        .count();
    assert_eq!(diagonal_steps, 9);
    assert_eq!(path.smoothed().first(), path.waypoints().first());
    assert_eq!(path.smoothed().last(), path.waypoints().last());
}

#[test]
fn corridor_wall_then_door() {
    let mut world = world_from(
        "
        ###########
        ...........
        ###########
        ",
    );
    let (west, east) = (TileCoord::new(0, 1), TileCoord::new(10, 1));
    let mid = TileCoord::new(5, 1);
    let regions_before = world.region_count();
    let areas_before = world.area_count();
    assert!(world.can_reach_tiles(west, east));

    assert!(world.place_object(mid, ObjectKind::Wall));
    world.verify().unwrap();
    assert_eq!(world.region_count(), regions_before + 1);
    assert_eq!(world.area_count(), areas_before + 1);
    assert!(!world.can_reach_tiles(west, east));
    assert!(!world.can_reach_tiles(east, west));

    assert!(world.place_object(mid, ObjectKind::Door));
    world.verify().unwrap();
    assert!(world.can_reach_tiles(west, east));
    assert!(world.can_reach_tiles(east, west));
    assert!(world.can_reach_tiles(west, mid));

    let path = find_path(&mut world, west, east, true);
    assert!(path.is_valid());
    assert!(path.tiles().contains(&mid));
    assert_eq!(path.tiles().first(), Some(&TileCoord::new(1, 1)));
}

#[test]
fn bisect_and_remerge_through_a_chokepoint() {
    let mut world = world_from(
        "
        ....#....
        ....#....
        .........
        ....#....
        ",
    );
    assert_eq!(world.area_count(), 1);
    let choke = TileCoord::new(4, 1);
    let area_tiles = |world: &NavWorld, tile| {
        let id = world.area_at(tile).unwrap();
        world.areas().tile_count(id)
    };
    assert_eq!(area_tiles(&world, choke), 33);

    world.place_object(choke, ObjectKind::Wall);
    world.verify().unwrap();
    assert_eq!(world.area_count(), 2);
    assert_eq!(area_tiles(&world, TileCoord::new(0, 0)), 16);
    assert_eq!(area_tiles(&world, TileCoord::new(8, 0)), 16);

    world.remove_object(choke);
    world.verify().unwrap();
    assert_eq!(world.area_count(), 1);
    assert_eq!(area_tiles(&world, TileCoord::new(0, 0)), 33);
}

#[test]
fn region_reachability_is_symmetric() {
    let world = world_from(
        "
        ##########..
        #....#...#..
        #....+...#..
        #....#...+..
        ###+######..
        ............
        ..~~~~......
        ..~TT~..h...
        ",
    );
    let ids: Vec<_> = world.regions().region_ids().collect();
    for &a in &ids {
        for &b in &ids {
            assert_eq!(world.can_reach_regions(a, b), world.can_reach_regions(b, a));
        }
    }
}

#[test]
fn reachability_matches_graph_connectivity_under_random_edits() {
    // Without doors, area links reduce to plain walkable connectivity.
    let mut rng = fastrand::Rng::with_seed(0x0b5e_55ed);
    let config = NavConfig {
        chunk_size: 6,
        ..NavConfig::default()
    };
    let mut world = NavWorld::new(config, TileMap::new(24, 18)).unwrap();
    for step in 0..250 {
        let tile = TileCoord::new(rng.i32(0..24), rng.i32(0..18));
        match rng.u8(0..5) {
            0 => world.place_object(tile, ObjectKind::Wall),
            1 => world.place_object(tile, ObjectKind::Resource),
            2 => world.set_terrain(tile, Terrain::Water),
            3 => world.set_terrain(tile, Terrain::Ground),
            _ => world.remove_object(tile),
        };
        world
            .verify()
            .unwrap_or_else(|e| panic!("step {step}: {e}"));
        for _ in 0..8 {
            let a = TileCoord::new(rng.i32(0..24), rng.i32(0..18));
            let b = TileCoord::new(rng.i32(0..24), rng.i32(0..18));
            assert_eq!(
                world.can_reach_tiles(a, b),
                graph_connected(&world, a, b),
                "step {step}: {a} -> {b}"
            );
        }
    }
}

#[test]
fn events_follow_each_edit_in_order() {
    let mut world = world_from("....\n....\n....");
    world.place_object(TileCoord::new(1, 1), ObjectKind::Wall);
    world.set_terrain(TileCoord::new(3, 0), Terrain::Rough);
    let result = world.tick();
    let kinds: Vec<_> = result.events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds.len(), 4);
    assert!(matches!(kinds[0], NavEventKind::GraphUpdated { .. }));
    assert_eq!(kinds[1], NavEventKind::RegionsUpdated);
    assert_eq!(kinds[2], NavEventKind::AreasUpdated);
    assert!(matches!(kinds[3], NavEventKind::GraphUpdated { .. }));
    let sequences: Vec<u64> = result.events.iter().map(|e| e.sequence).collect();
    assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    assert!(world.tick().events.is_empty());
}

#[test]
fn stale_paths_are_detectable_before_stepping() {
    let mut world = world_from(
        "
        .......
        .......
        ",
    );
    let mut path = find_path(&mut world, TileCoord::new(0, 0), TileCoord::new(6, 0), true);
    assert!(path.is_still_walkable(world.graph()));

    for y in 0..2 {
        world.place_object(TileCoord::new(3, y), ObjectKind::Wall);
    }
    assert!(!path.is_still_walkable(world.graph()));
    assert!(!world.can_reach_tiles(TileCoord::new(0, 0), TileCoord::new(6, 0)));

    // The consumer walks until the next waypoint turns out to be blocked.
    let mut walked = 0;
    while path.next_step_walkable(world.graph()) {
        path.next();
        walked += 1;
    }
    assert!(walked < 6);
    path.invalidate();
    assert!(!path.is_valid());

    let retry = find_path(&mut world, TileCoord::new(0, 0), TileCoord::new(6, 0), true);
    assert!(!retry.is_valid());
}

#[test]
fn many_concurrent_requests_all_complete() {
    let mut world = NavWorld::new(
        NavConfig {
            admissions_per_tick: 4,
            search_threads: 3,
            ..NavConfig::default()
        },
        TileMap::new(32, 32),
    )
    .unwrap();
    let done = Arc::new(Mutex::new(0usize));
    for i in 0..20 {
        let done = Arc::clone(&done);
        world.request_path(
            TileCoord::new(0, i),
            TileCoord::new(31, 31 - i),
            true,
            move |path| {
                assert!(path.is_valid());
                *done.lock().unwrap() += 1;
            },
        );
    }
    let completed = world.flush_paths();
    assert_eq!(completed.len(), 20);
    assert_eq!(*done.lock().unwrap(), 20);
    assert_eq!(world.pending_paths(), 0);
}
