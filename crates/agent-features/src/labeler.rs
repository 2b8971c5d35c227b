//! Direction labels over historical bars.

use agent_core::types::{Bar, Direction};

/// Label every bar by the direction of its close versus the previous close.
///
/// Index 0 has no previous bar and is `None`. Equal closes are `Down`.
pub fn label_directions(bars: &[Bar]) -> Vec<Option<Direction>> {
    let mut labels = Vec::with_capacity(bars.len());
    if bars.is_empty() {
        return labels;
    }

    labels.push(None);
    labels.extend(
        bars.windows(2)
            .map(|w| Some(Direction::between(w[0].close, w[1].close))),
    );
    labels
}
