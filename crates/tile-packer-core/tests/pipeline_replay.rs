use image::{Rgba, RgbaImage};
use tile_packer_core::prelude::*;

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba(rgba))
}

fn project(tile: u32, tileset: u32, paths: &[&str]) -> ProjectConfig {
    ProjectConfig {
        tile_width: tile,
        tile_height: tile,
        tileset_width: tileset,
        tileset_height: tileset,
        entries: paths.iter().map(|p| SourceEntry::new(*p)).collect(),
        ..ProjectConfig::default()
    }
}

fn entry<'a>(p: &'a ProjectConfig, path: &str) -> &'a SourceEntry {
    p.entries
        .iter()
        .find(|e| e.path == path)
        .unwrap_or_else(|| panic!("no entry {path}"))
}

fn positions(e: &SourceEntry) -> Vec<(usize, i64, i64)> {
    e.placement
        .iter()
        .map(|r| (r.tileset, r.tileset_x, r.tileset_y))
        .collect()
}

#[test]
fn three_units_then_a_two_by_two_goes_to_a_new_tileset() {
    let mut loader = MemorySourceLoader::new();
    loader.insert("a.png", solid(32, 32, [255, 0, 0, 255]));
    loader.insert("b.png", solid(32, 32, [0, 255, 0, 255]));
    loader.insert("c.png", solid(32, 32, [0, 0, 255, 255]));
    loader.insert("d.png", solid(64, 64, [255, 255, 0, 255]));
    let p = project(32, 64, &["a.png", "b.png", "c.png", "d.png"]);

    let mut sink = MemorySink::new();
    let out = pack_project(&p, &mut loader, &mut sink).expect("pack");

    assert_eq!(positions(entry(&out.project, "a.png")), vec![(0, 0, 0)]);
    assert_eq!(positions(entry(&out.project, "b.png")), vec![(0, 1, 0)]);
    assert_eq!(positions(entry(&out.project, "c.png")), vec![(0, 1, 1)]);
    assert_eq!(positions(entry(&out.project, "d.png")), vec![(1, 0, 0)]);

    // the full tileset is written as soon as it fills, the other one at the end
    let order: Vec<usize> = sink.tilesets.iter().map(|(i, _)| *i).collect();
    assert_eq!(order, vec![1, 0]);

    let first = sink.get(0).expect("tileset 0");
    assert_eq!(first.dimensions(), (64, 64));
    assert_eq!(*first.get_pixel(10, 10), Rgba([255, 0, 0, 255]));
    assert_eq!(*first.get_pixel(40, 10), Rgba([0, 255, 0, 255]));
    assert_eq!(*first.get_pixel(40, 40), Rgba([0, 0, 255, 255]));
    assert_eq!(*first.get_pixel(10, 40), Rgba([0, 0, 0, 0]));
    assert_eq!(*sink.get(1).expect("tileset 1").get_pixel(63, 63), Rgba([255, 255, 0, 255]));

    assert_eq!(out.summary.num_tilesets, 2);
    assert_eq!(out.summary.num_placed, 4);
    assert_eq!(out.summary.used_cells, 7);
    assert_eq!(out.summary.total_cells, 8);
    assert!(out.project.entries.iter().all(SourceEntry::is_placed));
}

#[test]
fn replay_keeps_positions_when_sources_are_added() {
    let mut loader = MemorySourceLoader::new();
    loader.insert("grass.png", solid(32, 32, [0, 200, 0, 255]));
    loader.insert("wall.png", solid(64, 32, [120, 120, 120, 255]));
    loader.insert("water.png", solid(32, 64, [0, 0, 200, 255]));
    let first_run = project(32, 128, &["grass.png", "wall.png", "water.png"]);
    let out1 = pack_project(&first_run, &mut loader, &mut MemorySink::new()).expect("first run");

    loader.insert("big.png", solid(96, 96, [200, 0, 0, 255]));
    loader.insert("a_tree.png", solid(64, 64, [0, 90, 0, 255]));
    let mut second_run = out1.project.clone();
    second_run.entries.push(SourceEntry::new("big.png"));
    second_run.entries.push(SourceEntry::new("a_tree.png"));

    let out2 = pack_project(&second_run, &mut loader, &mut MemorySink::new()).expect("second run");
    for path in ["grass.png", "wall.png", "water.png"] {
        assert_eq!(
            entry(&out1.project, path).placement,
            entry(&out2.project, path).placement,
            "{path} moved"
        );
    }
    assert_eq!(out2.summary.num_replayed, 3);
    assert_eq!(out2.summary.num_placed, 2);
    assert!(out2.project.entries.iter().all(SourceEntry::is_placed));

    // a third run with nothing new is stable too
    let out3 = pack_project(&out2.project, &mut loader, &mut MemorySink::new()).expect("third run");
    assert_eq!(out3.project, out2.project);
    assert_eq!(out3.summary.num_placed, 0);
}

#[test]
fn replay_renders_recorded_pixels() {
    let mut loader = MemorySourceLoader::new();
    loader.insert("a.png", solid(32, 32, [255, 0, 0, 255]));
    let mut p = project(32, 64, &["a.png"]);
    p.entries[0].placement.push(PlacementRecord {
        tileset: 1,
        tileset_x: 1,
        tileset_y: 0,
        sub_image_x: 0,
        sub_image_y: 0,
        sub_image_width: 1,
        sub_image_height: 1,
    });

    let mut sink = MemorySink::new();
    let out = pack_project(&p, &mut loader, &mut sink).expect("pack");
    assert_eq!(positions(&out.project.entries[0]), vec![(1, 1, 0)]);
    // tileset 0 is created to reach index 1 and written empty
    assert_eq!(out.summary.num_tilesets, 2);
    assert!(sink.get(0).expect("tileset 0").pixels().all(|px| px[3] == 0));
    let second = sink.get(1).expect("tileset 1");
    assert_eq!(*second.get_pixel(40, 5), Rgba([255, 0, 0, 255]));
    assert_eq!(*second.get_pixel(5, 5), Rgba([0, 0, 0, 0]));
}

#[test]
fn overlapping_records_are_a_conflict() {
    let mut loader = MemorySourceLoader::new();
    loader.insert("a.png", solid(64, 64, [1, 1, 1, 255]));
    loader.insert("b.png", solid(32, 32, [2, 2, 2, 255]));
    let mut p = project(32, 128, &["a.png", "b.png"]);
    p.entries[0].placement.push(PlacementRecord {
        tileset: 0,
        tileset_x: 0,
        tileset_y: 0,
        sub_image_x: 0,
        sub_image_y: 0,
        sub_image_width: 2,
        sub_image_height: 2,
    });
    p.entries[1].placement.push(PlacementRecord {
        tileset: 0,
        tileset_x: 1,
        tileset_y: 1,
        sub_image_x: 0,
        sub_image_y: 0,
        sub_image_width: 1,
        sub_image_height: 1,
    });
    let err = pack_project(&p, &mut loader, &mut MemorySink::new()).unwrap_err();
    assert!(matches!(
        err,
        TilePackerError::PlacementConflict { ref path, tileset: 0, x: 1, y: 1 } if path == "b.png"
    ));
}

#[test]
fn record_outside_the_grid_is_a_conflict() {
    let mut loader = MemorySourceLoader::new();
    loader.insert("a.png", solid(32, 32, [1, 1, 1, 255]));
    let mut p = project(32, 64, &["a.png"]);
    p.entries[0].placement.push(PlacementRecord {
        tileset: 0,
        tileset_x: 5,
        tileset_y: 0,
        sub_image_x: 0,
        sub_image_y: 0,
        sub_image_width: 1,
        sub_image_height: 1,
    });
    let err = pack_project(&p, &mut loader, &mut MemorySink::new()).unwrap_err();
    assert!(matches!(err, TilePackerError::PlacementConflict { x: 5, .. }));
}

#[test]
fn record_at_the_edge_of_the_coordinate_range_is_a_conflict() {
    let mut loader = MemorySourceLoader::new();
    loader.insert("a.png", solid(64, 32, [1, 1, 1, 255]));
    let mut p = project(32, 64, &["a.png"]);
    p.entries[0].placement.push(PlacementRecord {
        tileset: 0,
        tileset_x: u32::MAX as i64,
        tileset_y: 0,
        sub_image_x: 0,
        sub_image_y: 0,
        sub_image_width: 2,
        sub_image_height: 1,
    });
    let mut sink = MemorySink::new();
    let err = pack_project(&p, &mut loader, &mut sink).unwrap_err();
    assert!(matches!(
        err,
        TilePackerError::PlacementConflict { tileset: 0, x: u32::MAX, y: 0, .. }
    ));
    assert!(sink.tilesets.is_empty());
}

#[test]
fn record_in_an_absurd_tileset_is_a_conflict() {
    let mut loader = MemorySourceLoader::new();
    loader.insert("a.png", solid(32, 32, [1, 1, 1, 255]));
    let mut p = project(32, 64, &["a.png"]);
    p.entries[0].placement.push(PlacementRecord {
        tileset: 1_000_000_000,
        tileset_x: 0,
        tileset_y: 0,
        sub_image_x: 0,
        sub_image_y: 0,
        sub_image_width: 1,
        sub_image_height: 1,
    });
    let mut sink = MemorySink::new();
    let err = pack_project(&p, &mut loader, &mut sink).unwrap_err();
    assert!(matches!(
        err,
        TilePackerError::PlacementConflict { tileset: 1_000_000_000, .. }
    ));
    assert!(sink.tilesets.is_empty());
}

#[test]
fn partially_unplaced_entry_is_packed_again() {
    let mut loader = MemorySourceLoader::new();
    loader.insert("a.png", solid(32, 32, [1, 1, 1, 255]));
    let mut p = project(32, 64, &["a.png"]);
    p.entries[0].placement.push(PlacementRecord {
        tileset: 3,
        tileset_x: -1,
        tileset_y: 0,
        sub_image_x: 0,
        sub_image_y: 0,
        sub_image_width: 1,
        sub_image_height: 1,
    });
    let out = pack_project(&p, &mut loader, &mut MemorySink::new()).expect("pack");
    assert_eq!(positions(&out.project.entries[0]), vec![(0, 0, 0)]);
    assert_eq!(out.summary.num_replayed, 0);
    assert_eq!(out.summary.num_tilesets, 1);
}

#[test]
fn oversized_source_is_split_and_decoded_once() {
    let mut src = RgbaImage::new(128, 64);
    for (x, _, px) in src.enumerate_pixels_mut() {
        *px = Rgba([(x / 32) as u8 * 60, 0, 0, 255]);
    }
    let mut loader = MemorySourceLoader::new();
    loader.insert("wide.png", src);
    let p = project(32, 64, &["wide.png"]);

    let mut sink = MemorySink::new();
    let out = pack_project(&p, &mut loader, &mut sink).expect("pack");

    let e = &out.project.entries[0];
    assert_eq!(positions(e), vec![(0, 0, 0), (1, 0, 0)]);
    let subs: Vec<(u32, u32)> = e
        .placement
        .iter()
        .map(|r| (r.sub_image_x, r.sub_image_width))
        .collect();
    assert_eq!(subs, vec![(0, 2), (2, 2)]);
    assert_eq!(out.summary.num_split_sources, 1);
    assert_eq!(loader.load_count("wide.png"), 1);

    // left half in tileset 0, right half in tileset 1
    let t0 = sink.get(0).expect("tileset 0");
    let t1 = sink.get(1).expect("tileset 1");
    assert_eq!(t0.get_pixel(0, 0)[0], 0);
    assert_eq!(t0.get_pixel(40, 0)[0], 60);
    assert_eq!(t1.get_pixel(0, 0)[0], 120);
    assert_eq!(t1.get_pixel(40, 0)[0], 180);
}

#[test]
fn empty_project_writes_nothing() {
    let p = project(32, 64, &[]);
    let mut sink = MemorySink::new();
    let out = pack_project(&p, &mut MemorySourceLoader::new(), &mut sink).expect("pack");
    assert!(sink.tilesets.is_empty());
    assert_eq!(out.summary, PackSummary::default());
}

#[test]
fn input_project_is_left_untouched() {
    let mut loader = MemorySourceLoader::new();
    loader.insert("a.png", solid(32, 32, [1, 1, 1, 255]));
    let p = project(32, 64, &["a.png"]);
    let before = p.clone();
    let _ = pack_project(&p, &mut loader, &mut MemorySink::new()).expect("pack");
    assert_eq!(p, before);
}
