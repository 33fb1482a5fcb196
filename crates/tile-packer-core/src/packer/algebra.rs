use crate::model::Rect;

/// Overlap of two rectangles, or `None` when they do not touch.
///
/// Bounds are inclusive, so two rectangles sharing a single cell intersect
/// with a 1x1 result.
pub fn intersect(a: &Rect, b: &Rect) -> Option<Rect> {
    if a.w == 0 || a.h == 0 || b.w == 0 || b.h == 0 || !a.intersects(b) {
        return None;
    }
    let x = a.x.max(b.x);
    let y = a.y.max(b.y);
    let max_x = a.max_x().min(b.max_x());
    let max_y = a.max_y().min(b.max_y());
    Some(Rect::new(x, y, (max_x - x) + 1, (max_y - y) + 1))
}

/// Remaining space of `outer` once `inner` is taken out of it.
///
/// Produces up to four maximal bands in the order left, top, right, bottom.
/// Left/right bands span the full height of `outer` and top/bottom bands its
/// full width, so bands overlap each other at the corners; together they
/// cover exactly `outer` minus `inner`. Zero-sized bands are not emitted.
/// `inner` is clipped to `outer` first; if they do not overlap, `outer` is
/// returned unchanged.
pub fn subtract(outer: &Rect, inner: &Rect) -> Vec<Rect> {
    let mut out = Vec::with_capacity(4);
    subtract_into(&mut out, outer, inner);
    out
}

/// Same as [`subtract`], appending into `out`.
pub fn subtract_into(out: &mut Vec<Rect>, outer: &Rect, inner: &Rect) {
    let Some(inner) = intersect(outer, inner) else {
        if outer.w > 0 && outer.h > 0 {
            out.push(*outer);
        }
        return;
    };

    let left_min_x = outer.x.min(inner.x);
    let left_max_x = outer.x.max(inner.x);
    let top_min_y = outer.y.min(inner.y);
    let top_max_y = outer.y.max(inner.y);
    let right_min_x = outer.max_x().min(inner.max_x());
    let right_max_x = outer.max_x().max(inner.max_x());
    let bottom_min_y = outer.max_y().min(inner.max_y());
    let bottom_max_y = outer.max_y().max(inner.max_y());

    let full_w = (right_max_x - left_min_x) + 1;
    let full_h = (bottom_max_y - top_min_y) + 1;

    // left
    if left_min_x != left_max_x {
        out.push(Rect::new(left_min_x, top_min_y, left_max_x - left_min_x, full_h));
    }
    // top
    if top_min_y != top_max_y {
        out.push(Rect::new(left_min_x, top_min_y, full_w, top_max_y - top_min_y));
    }
    // right
    if right_min_x != right_max_x {
        out.push(Rect::new(right_min_x + 1, top_min_y, right_max_x - right_min_x, full_h));
    }
    // bottom
    if bottom_min_y != bottom_max_y {
        out.push(Rect::new(left_min_x, bottom_min_y + 1, full_w, bottom_max_y - bottom_min_y));
    }
}
