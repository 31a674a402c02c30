use ratatui::text::Line;
use ratatui::text::Span;

/// Prefix the first line with `initial` and every following line with
/// `subsequent`. Line-level styles are preserved.
pub(crate) fn prefix_lines(
    lines: Vec<Line<'static>>,
    initial: Span<'static>,
    subsequent: Span<'static>,
) -> Vec<Line<'static>> {
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let prefix = if i == 0 {
                initial.clone()
            } else {
                subsequent.clone()
            };
            let mut spans = vec![prefix];
            spans.extend(line.spans);
            Line::from(spans).style(line.style)
        })
        .collect()
}
