//! Connected-component labeling of a binary mask.
//!
//! Flood fill in raster order with configurable 4/8-connectivity. Label order
//! follows the raster scan, which gives the deterministic "first encountered
//! wins" tie-break when components are ranked by size.

use serde::{Deserialize, Serialize};

/// Pixel adjacency used when growing components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connectivity {
    /// Edge-adjacent neighbors only.
    Four,
    /// Edge- and corner-adjacent neighbors ("fully connected").
    #[default]
    Eight,
}

impl Connectivity {
    fn offsets(&self) -> &'static [(i32, i32)] {
        match self {
            Connectivity::Four => &[(-1, 0), (1, 0), (0, -1), (0, 1)],
            Connectivity::Eight => &[
                (-1, -1),
                (0, -1),
                (1, -1),
                (-1, 0),
                (1, 0),
                (-1, 1),
                (0, 1),
                (1, 1),
            ],
        }
    }
}

/// One labeled foreground component with its bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// 1-based label; 0 marks background in the label map.
    pub label: u32,
    pub pixel_count: usize,
    pub min_x: usize,
    pub max_x: usize,
    pub min_y: usize,
    pub max_y: usize,
}

impl Component {
    /// Midpoint of the column span.
    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) as f64 / 2.0
    }

    /// Midpoint of the row span.
    pub fn center_y(&self) -> f64 {
        (self.min_y + self.max_y) as f64 / 2.0
    }
}

/// Label map plus per-component summaries, in raster discovery order.
#[derive(Debug, Clone)]
pub struct ComponentMap {
    pub w: usize,
    pub h: usize,
    /// Per-pixel component label, 0 for background.
    pub labels: Vec<u32>,
    /// Components indexed by `label - 1`.
    pub components: Vec<Component>,
}

impl ComponentMap {
    /// Components of at least `min_pixels`, largest first.
    ///
    /// Stable sort: equal-sized components keep raster discovery order.
    pub fn ranked(&self, min_pixels: usize) -> Vec<&Component> {
        let mut out: Vec<&Component> = self
            .components
            .iter()
            .filter(|c| c.pixel_count >= min_pixels)
            .collect();
        out.sort_by(|a, b| b.pixel_count.cmp(&a.pixel_count));
        out
    }

    /// Whether the pixel at (x, y) belongs to the given component.
    pub fn is_labeled(&self, x: usize, y: usize, label: u32) -> bool {
        self.labels[y * self.w + x] == label
    }
}

/// Label the foreground of `mask` (row-major, `w * h`).
pub fn label_components(mask: &[bool], w: usize, h: usize, connectivity: Connectivity) -> ComponentMap {
    assert_eq!(mask.len(), w * h);
    let mut labels = vec![0u32; w * h];
    let mut components = Vec::new();
    let mut queue: Vec<(usize, usize)> = Vec::new();

    for start_y in 0..h {
        for start_x in 0..w {
            let start = start_y * w + start_x;
            if !mask[start] || labels[start] != 0 {
                continue;
            }

            let label = components.len() as u32 + 1;
            let mut comp = Component {
                label,
                pixel_count: 0,
                min_x: start_x,
                max_x: start_x,
                min_y: start_y,
                max_y: start_y,
            };

            labels[start] = label;
            queue.push((start_x, start_y));
            while let Some((x, y)) = queue.pop() {
                comp.pixel_count += 1;
                comp.min_x = comp.min_x.min(x);
                comp.max_x = comp.max_x.max(x);
                comp.min_y = comp.min_y.min(y);
                comp.max_y = comp.max_y.max(y);

                for &(dx, dy) in connectivity.offsets() {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                        continue;
                    }
                    let ni = ny as usize * w + nx as usize;
                    if mask[ni] && labels[ni] == 0 {
                        labels[ni] = label;
                        queue.push((nx as usize, ny as usize));
                    }
                }
            }

            components.push(comp);
        }
    }

    ComponentMap {
        w,
        h,
        labels,
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> (Vec<bool>, usize, usize) {
        let h = rows.len();
        let w = rows[0].len();
        let mut mask = Vec::with_capacity(w * h);
        for row in rows {
            for ch in row.chars() {
                mask.push(ch == '#');
            }
        }
        (mask, w, h)
    }

    #[test]
    fn diagonal_pixels_split_under_four_connectivity() {
        let (mask, w, h) = mask_from(&["#.", ".#"]);

        let four = label_components(&mask, w, h, Connectivity::Four);
        assert_eq!(four.components.len(), 2);

        let eight = label_components(&mask, w, h, Connectivity::Eight);
        assert_eq!(eight.components.len(), 1);
        assert_eq!(eight.components[0].pixel_count, 2);
    }

    #[test]
    fn bounding_boxes_and_counts() {
        let (mask, w, h) = mask_from(&[
            "....##....",
            "....##....",
            "..........",
            "######....",
        ]);
        let map = label_components(&mask, w, h, Connectivity::Eight);
        assert_eq!(map.components.len(), 2);

        let ranked = map.ranked(0);
        assert_eq!(ranked[0].pixel_count, 6);
        assert_eq!(ranked[0].min_y, 3);
        assert_eq!(ranked[0].min_x, 0);
        assert_eq!(ranked[0].max_x, 5);
        assert_eq!(ranked[1].pixel_count, 4);
    }

    #[test]
    fn equal_sizes_keep_raster_order() {
        let (mask, w, h) = mask_from(&["##..##", "......"]);
        let map = label_components(&mask, w, h, Connectivity::Four);
        let ranked = map.ranked(0);
        assert_eq!(ranked.len(), 2);
        // Both have 2 pixels; the left one was discovered first.
        assert_eq!(ranked[0].min_x, 0);
        assert_eq!(ranked[1].min_x, 4);
    }

    #[test]
    fn min_pixels_filters_speckle() {
        let (mask, w, h) = mask_from(&["#....", ".....", "..###"]);
        let map = label_components(&mask, w, h, Connectivity::Eight);
        let ranked = map.ranked(2);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].pixel_count, 3);
    }
}
