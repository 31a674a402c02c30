//! CommonMark rendering for message content.
//!
//! Converts markdown-flavored text into `ratatui` rich text. The conversion
//! is a pure function: same input, same output, no side effects. Malformed
//! constructs never fail — pulldown-cmark treats them as literal text, so the
//! worst case is an unstyled line. A single paragraph renders without
//! surrounding blank lines to avoid extra vertical space for one-line
//! messages.

use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::Event;
use pulldown_cmark::HeadingLevel;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::text::Text;

use crate::render::highlight::highlight_code_block;

const RULE_WIDTH: usize = 32;

pub fn render_markdown_text(source: &str) -> Text<'static> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut writer = MarkdownWriter::default();
    for event in Parser::new_ext(source, options) {
        writer.handle(event);
    }
    Text::from(writer.finish())
}

#[derive(Clone, Debug)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

#[derive(Default)]
struct MarkdownWriter {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListKind>,
    /// Continuation indent for each open list item, in columns.
    item_indents: Vec<usize>,
    quote_depth: usize,
    /// `Some` while inside a fenced/indented code block: (language, buffer).
    code_block: Option<(String, String)>,
    /// Open links: index into `current` where the link text starts, and the
    /// destination URL to append when the text does not already show it.
    open_links: Vec<(usize, String)>,
}

impl MarkdownWriter {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => {
                if let Some((_, buffer)) = self.code_block.as_mut() {
                    buffer.push_str(&text);
                } else {
                    self.push_text(text.to_string(), self.style());
                }
            }
            Event::Code(code) => {
                self.push_text(code.to_string(), self.style().cyan());
            }
            Event::SoftBreak | Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.block_break();
                self.lines.push(Line::from("─".repeat(RULE_WIDTH)).dim());
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                // No HTML rendering in a terminal: degrade to literal text.
                self.push_text(html.to_string(), self.style());
            }
            Event::FootnoteReference(name) => {
                self.push_text(format!("[{name}]"), self.style().dim());
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_text(marker.to_string(), self.style());
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.list_stack.is_empty() {
                    self.block_break();
                } else if self.current.is_empty() {
                    // Second paragraph of a loose list item.
                    self.lines.push(Line::default());
                }
            }
            Tag::Heading { level, .. } => {
                self.block_break();
                self.style_stack.push(heading_style(level));
            }
            Tag::BlockQuote => {
                self.block_break();
                self.quote_depth += 1;
            }
            Tag::List(start) => {
                if self.list_stack.is_empty() {
                    self.block_break();
                } else {
                    self.flush_line();
                }
                self.list_stack.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
            }
            Tag::Item => {
                self.flush_line();
                let indent = self.list_stack.len().saturating_sub(1) * 2;
                let marker = match self.list_stack.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let current = *n;
                        *n += 1;
                        format!("{current}. ")
                    }
                    _ => "- ".to_string(),
                };
                self.push_quote_prefix();
                if indent > 0 {
                    self.current.push(Span::raw(" ".repeat(indent)));
                }
                self.item_indents.push(indent + marker.chars().count());
                self.current.push(Span::raw(marker));
            }
            Tag::CodeBlock(kind) => {
                self.block_break();
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code_block = Some((lang, String::new()));
            }
            Tag::Emphasis => self.push_modifier(Modifier::ITALIC),
            Tag::Strong => self.push_modifier(Modifier::BOLD),
            Tag::Strikethrough => self.push_modifier(Modifier::CROSSED_OUT),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.open_links
                    .push((self.current.len(), dest_url.to_string()));
                self.style_stack
                    .push(self.style().blue().add_modifier(Modifier::UNDERLINED));
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush_line(),
            TagEnd::Heading(_) => {
                self.flush_line();
                self.style_stack.pop();
            }
            TagEnd::BlockQuote => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
            }
            TagEnd::Item => {
                self.flush_line();
                self.item_indents.pop();
            }
            TagEnd::CodeBlock => self.end_code_block(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.style_stack.pop();
            }
            TagEnd::Link | TagEnd::Image => self.end_link(),
            _ => {}
        }
    }

    fn end_code_block(&mut self) {
        let Some((lang, code)) = self.code_block.take() else {
            return;
        };
        match highlight_code_block(&lang, &code) {
            Some(lines) => self.lines.extend(lines),
            None => {
                // Unknown language or guardrail tripped: literal text.
                self.lines
                    .extend(code.lines().map(|line| Line::from(line.to_string())));
            }
        }
    }

    fn end_link(&mut self) {
        self.style_stack.pop();
        let Some((text_start, dest)) = self.open_links.pop() else {
            return;
        };
        if dest.is_empty() {
            return;
        }
        // Skip the URL suffix when the link text already shows it (autolinks)
        // or when the text was flushed across lines and cannot be compared.
        if text_start <= self.current.len() {
            let text: String = self.current[text_start..]
                .iter()
                .map(|span| span.content.as_ref())
                .collect();
            if text == dest {
                return;
            }
        }
        self.current.push(format!(" ({dest})").dim());
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }

    fn style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        self.style_stack.push(self.style().add_modifier(modifier));
    }

    fn push_text(&mut self, text: String, style: Style) {
        if self.current.is_empty() {
            self.push_quote_prefix();
            if let Some(indent) = self.item_indents.last().copied()
                && indent > 0
            {
                self.current.push(Span::raw(" ".repeat(indent)));
            }
        }
        self.current.push(Span::styled(text, style));
    }

    fn push_quote_prefix(&mut self) {
        for _ in 0..self.quote_depth {
            self.current.push("▌ ".dim());
        }
    }

    fn flush_line(&mut self) {
        if !self.current.is_empty() {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(Line::from(spans));
        }
    }

    /// Separate the upcoming block from whatever precedes it with a single
    /// blank line. Never emits a leading blank, so single-block input stays
    /// free of vertical padding.
    fn block_break(&mut self) {
        self.flush_line();
        if self.lines.last().is_some_and(|line| !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default().bold().underlined(),
        HeadingLevel::H2 => Style::default().bold(),
        _ => Style::default().bold().italic(),
    }
}
