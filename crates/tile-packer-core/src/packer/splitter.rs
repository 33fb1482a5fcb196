use crate::model::Piece;

/// Splits `piece` until every part fits a `max_w x max_h` grid.
///
/// Width is halved first (left half, then right half), then height (top,
/// then bottom), depth first. With `half = extent / 2` a 5-wide piece and
/// `max_w = 2` yields widths `2, 1, 2`. Both limits must be at least 1;
/// [`RunConfig::validate`](crate::config::RunConfig::validate) guarantees
/// that for configured runs.
pub fn normalize(piece: Piece, max_w: u32, max_h: u32) -> Vec<Piece> {
    let mut out = Vec::new();
    normalize_into(&mut out, piece, max_w.max(1), max_h.max(1));
    out
}

fn normalize_into(out: &mut Vec<Piece>, piece: Piece, max_w: u32, max_h: u32) {
    if piece.width > max_w {
        let half = piece.width / 2;
        normalize_into(out, piece.sub_piece(0, 0, half, piece.height), max_w, max_h);
        normalize_into(
            out,
            piece.sub_piece(half, 0, piece.width - half, piece.height),
            max_w,
            max_h,
        );
    } else if piece.height > max_h {
        let half = piece.height / 2;
        normalize_into(out, piece.sub_piece(0, 0, piece.width, half), max_w, max_h);
        normalize_into(
            out,
            piece.sub_piece(0, half, piece.width, piece.height - half),
            max_w,
            max_h,
        );
    } else {
        out.push(piece);
    }
}
