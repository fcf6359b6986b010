//! Atlas tile layout.
//!
//! Pure math mapping a shadow-slot index and a split factor to a tile of the
//! shared atlas, and remapping clip-space projection matrices into that
//! tile's sub-rectangle.

use nalgebra::{Matrix4, Vector2, Vector4};

/// A tile's viewport rectangle within the atlas, in texels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileViewport {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// The number of tiles along each atlas axis for the given total tile count.
///
/// Splits are powers of two so they always divide the power-of-two atlas
/// resolution exactly, keeping tile edges on texel boundaries.
pub fn split_factor(tile_count: u32) -> u32 {
    if tile_count <= 1 {
        1
    } else if tile_count <= 4 {
        2
    } else {
        4
    }
}

/// The row-major grid coordinates of the tile with the given index on a
/// `split` x `split` grid.
pub fn tile_offset(tile_index: u32, split: u32) -> Vector2<f32> {
    Vector2::new((tile_index % split) as f32, (tile_index / split) as f32)
}

/// The texel-space viewport rectangle of the tile with the given index.
pub fn tile_viewport(tile_index: u32, split: u32, tile_size: u32) -> TileViewport {
    let offset = tile_offset(tile_index, split);
    TileViewport {
        x: offset.x as u32 * tile_size,
        y: offset.y as u32 * tile_size,
        size: tile_size,
    }
}

/// Remaps the clip-space output of a world-to-clip matrix into the atlas
/// sub-rectangle at `offset` with side length `tile_scale` (in normalized
/// atlas units): x and y are rescaled from [-1, 1] into the tile within
/// [0, 1]^2, depth is rescaled into [0, 1] without tiling.
///
/// When `reversed_z` is set, the z row is negated first so the stored depth
/// direction matches the standard convention.
///
/// The remap edits the coefficients directly rather than composing with a
/// scale-and-offset matrix, which would reintroduce products of near-zero
/// terms.
pub fn to_atlas_matrix(
    mut m: Matrix4<f32>,
    offset: Vector2<f32>,
    tile_scale: f32,
    reversed_z: bool,
) -> Matrix4<f32> {
    if reversed_z {
        m.m31 = -m.m31;
        m.m32 = -m.m32;
        m.m33 = -m.m33;
        m.m34 = -m.m34;
    }

    m.m11 = (0.5 * (m.m11 + m.m41) + offset.x * m.m41) * tile_scale;
    m.m12 = (0.5 * (m.m12 + m.m42) + offset.x * m.m42) * tile_scale;
    m.m13 = (0.5 * (m.m13 + m.m43) + offset.x * m.m43) * tile_scale;
    m.m14 = (0.5 * (m.m14 + m.m44) + offset.x * m.m44) * tile_scale;

    m.m21 = (0.5 * (m.m21 + m.m41) + offset.y * m.m41) * tile_scale;
    m.m22 = (0.5 * (m.m22 + m.m42) + offset.y * m.m42) * tile_scale;
    m.m23 = (0.5 * (m.m23 + m.m43) + offset.y * m.m43) * tile_scale;
    m.m24 = (0.5 * (m.m24 + m.m44) + offset.y * m.m44) * tile_scale;

    m.m31 = 0.5 * (m.m31 + m.m41);
    m.m32 = 0.5 * (m.m32 + m.m42);
    m.m33 = 0.5 * (m.m33 + m.m43);
    m.m34 = 0.5 * (m.m34 + m.m44);

    m
}

/// The tile vector consumed by the point/spot sampling shader: the tile's
/// minimum corner in normalized atlas coordinates inset by half a texel, the
/// clamped span, and the light's sampling bias.
pub fn other_tile_data(
    offset: Vector2<f32>,
    tile_scale: f32,
    border: f32,
    bias: f32,
) -> Vector4<f32> {
    Vector4::new(
        offset.x * tile_scale + border,
        offset.y * tile_scale + border,
        tile_scale - border - border,
        bias,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point3;

    #[test]
    fn split_factor_matches_tile_count_thresholds() {
        assert_eq!(split_factor(0), 1);
        assert_eq!(split_factor(1), 1);
        assert_eq!(split_factor(2), 2);
        assert_eq!(split_factor(4), 2);
        assert_eq!(split_factor(5), 4);
        assert_eq!(split_factor(16), 4);
    }

    #[test]
    fn tile_offsets_are_row_major() {
        assert_eq!(tile_offset(0, 2), Vector2::new(0.0, 0.0));
        assert_eq!(tile_offset(1, 2), Vector2::new(1.0, 0.0));
        assert_eq!(tile_offset(2, 2), Vector2::new(0.0, 1.0));
        assert_eq!(tile_offset(3, 2), Vector2::new(1.0, 1.0));
        assert_eq!(tile_offset(6, 4), Vector2::new(2.0, 1.0));
    }

    #[test]
    fn full_grid_of_tiles_covers_the_atlas_without_overlap() {
        for split in [1u32, 2, 4] {
            let tile_size = 1024 / split;
            let mut covered = vec![false; (split * split) as usize];

            for tile_index in 0..split * split {
                let viewport = tile_viewport(tile_index, split, tile_size);
                assert_eq!(viewport.size, tile_size);
                assert!(viewport.x + tile_size <= 1024);
                assert!(viewport.y + tile_size <= 1024);

                let cell = (viewport.y / tile_size * split + viewport.x / tile_size) as usize;
                assert!(!covered[cell], "tile {tile_index} overlaps cell {cell}");
                covered[cell] = true;
            }

            assert!(covered.iter().all(|&cell| cell));
        }
    }

    #[test]
    fn identity_remap_lands_clip_space_in_unit_range() {
        let m = to_atlas_matrix(Matrix4::identity(), Vector2::zeros(), 1.0, false);

        for corner in [
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(1.0, -1.0, 1.0),
        ] {
            let mapped = m.transform_point(&corner);
            for component in [mapped.x, mapped.y, mapped.z] {
                assert!((0.0..=1.0).contains(&component), "{mapped:?}");
            }
        }

        // The extremes of the clip cube map exactly onto the unit cube.
        let lower = m.transform_point(&Point3::new(-1.0, -1.0, -1.0));
        assert_abs_diff_eq!(lower.x, 0.0);
        assert_abs_diff_eq!(lower.y, 0.0);
        assert_abs_diff_eq!(lower.z, 0.0);
        let upper = m.transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_abs_diff_eq!(upper.x, 1.0);
        assert_abs_diff_eq!(upper.y, 1.0);
        assert_abs_diff_eq!(upper.z, 1.0);
    }

    #[test]
    fn remap_offsets_into_the_assigned_tile() {
        // Tile (1, 0) on a 2x2 grid: x in [0.5, 1], y in [0, 0.5].
        let m = to_atlas_matrix(Matrix4::identity(), Vector2::new(1.0, 0.0), 0.5, false);

        let lower = m.transform_point(&Point3::new(-1.0, -1.0, -1.0));
        assert_abs_diff_eq!(lower.x, 0.5);
        assert_abs_diff_eq!(lower.y, 0.0);
        let upper = m.transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_abs_diff_eq!(upper.x, 1.0);
        assert_abs_diff_eq!(upper.y, 0.5);
    }

    #[test]
    fn reversed_z_negates_the_depth_row_before_remapping() {
        let m = to_atlas_matrix(Matrix4::identity(), Vector2::zeros(), 1.0, true);

        // With the z row negated, clip z = 1 (near under the reversed
        // convention) lands at stored depth 0.
        let near = m.transform_point(&Point3::new(0.0, 0.0, 1.0));
        assert_abs_diff_eq!(near.z, 0.0);
        let far = m.transform_point(&Point3::new(0.0, 0.0, -1.0));
        assert_abs_diff_eq!(far.z, 1.0);
    }

    #[test]
    fn remap_agrees_with_explicit_matrix_composition() {
        // The coefficient edits must be algebraically identical to composing
        // with the scale-and-offset matrix for the tile.
        let mut projection = Matrix4::identity();
        projection.m11 = 0.5;
        projection.m22 = 0.7;
        projection.m33 = -0.01;
        projection.m34 = 0.9;
        projection.m14 = 0.25;

        let offset = Vector2::new(1.0, 1.0);
        let tile_scale = 0.5;

        let remapped = to_atlas_matrix(projection, offset, tile_scale, false);

        let mut tile_transform = Matrix4::identity();
        tile_transform.m11 = 0.5 * tile_scale;
        tile_transform.m14 = (0.5 + offset.x) * tile_scale;
        tile_transform.m22 = 0.5 * tile_scale;
        tile_transform.m24 = (0.5 + offset.y) * tile_scale;
        tile_transform.m33 = 0.5;
        tile_transform.m34 = 0.5;
        let composed = tile_transform * projection;

        for (a, b) in remapped.iter().zip(composed.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn tile_data_insets_bounds_by_the_border() {
        let data = other_tile_data(Vector2::new(1.0, 2.0), 0.25, 0.001, 0.5);
        assert_abs_diff_eq!(data.x, 0.251);
        assert_abs_diff_eq!(data.y, 0.501);
        assert_abs_diff_eq!(data.z, 0.25 - 0.002);
        assert_abs_diff_eq!(data.w, 0.5);
    }
}
