use shared_types::{Bounds1D, Dataset};

/// Y range of every finite point whose x lies inside `x_range`.
///
/// Points just outside the range still count when their neighbour is inside,
/// so a line entering the viewport from off-screen is not clipped vertically.
pub fn calculate_min_max_y(datasets: &[Dataset], x_range: Bounds1D) -> Option<Bounds1D> {
    let mut range: Option<Bounds1D> = None;
    for dataset in datasets {
        let points = &dataset.points;
        for (i, point) in points.iter().enumerate() {
            if !point.is_finite() {
                continue;
            }
            let inside = x_range.contains(point.x);
            let neighbour_inside = (i > 0 && x_range.contains(points[i - 1].x))
                || points.get(i + 1).is_some_and(|p| x_range.contains(p.x));
            if inside || neighbour_inside {
                range = Some(match range {
                    Some(r) => r.including(point.y),
                    None => Bounds1D {
                        min: point.y,
                        max: point.y,
                    },
                });
            }
        }
    }
    log::debug!("[calculate_min_max_y] Visible y range {range:?}");
    range
}
