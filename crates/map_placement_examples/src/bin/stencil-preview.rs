//! Render a placement stencil as ASCII, tiled 2x2 to show that the
//! separation survives tile boundaries.
use glam::Vec2;
use map_placement::prelude::*;
use map_placement_examples::init_tracing;
use tracing::info;

const PREVIEW_CELLS: usize = 48;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let stencil = Stencil::generate([8u32, 8u32], 42)?;
    let dims = stencil.dims();

    // Tile the stencil 2x2 in slot units.
    let tiled: Vec<Vec2> = (0..2)
        .flat_map(|ty| {
            let entries = stencil.entries();
            (0..2).flat_map(move |tx| {
                entries.iter().map(move |&entry| {
                    entry + Vec2::new((tx * dims.x) as f32, (ty * dims.y) as f32)
                })
            })
        })
        .collect();

    let span = (dims.x * 2) as f32;
    let mut rows = vec![vec!['.'; PREVIEW_CELLS]; PREVIEW_CELLS];
    for point in &tiled {
        let col = (point.x / span * PREVIEW_CELLS as f32) as usize;
        let row = (point.y / span * PREVIEW_CELLS as f32) as usize;
        rows[row.min(PREVIEW_CELLS - 1)][col.min(PREVIEW_CELLS - 1)] = '#';
    }

    println!("stencil {}x{} tiled 2x2:", dims.x, dims.y);
    for row in rows {
        println!("{}", row.into_iter().collect::<String>());
    }

    // With a slot pitch of 2 footprints, slot units are 2 footprints wide:
    // the minimum pairwise distance in slot units must stay above 0.5.
    let mut min_dist = f32::MAX;
    for i in 0..tiled.len() {
        for j in (i + 1)..tiled.len() {
            min_dist = min_dist.min(tiled[i].distance(tiled[j]));
        }
    }
    info!("Minimum tiled distance: {min_dist:.3} slot units (bound 0.5).");

    Ok(())
}
