//! Markdown to styled terminal text
//!
//! Bot replies are CommonMark. This walks the `pulldown-cmark` event stream
//! and turns it into ratatui lines, keeping the structure readable in a
//! terminal: headings, emphasis, lists, quotes, and code keep their shape,
//! everything else degrades to plain text.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const RULE_WIDTH: usize = 24;

fn heading_style(level: HeadingLevel) -> Style {
    let base = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => base.add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H2 => base,
        _ => Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD),
    }
}

fn code_style() -> Style {
    Style::default().fg(Color::Yellow)
}

struct Renderer {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    // One entry per open list: the next number for ordered lists
    lists: Vec<Option<u64>>,
    pending_marker: Option<String>,
    quote_depth: usize,
    in_code_block: bool,
    link: Option<(String, String)>, // (destination, text seen so far)
}

impl Renderer {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            styles: Vec::new(),
            lists: Vec::new(),
            pending_marker: None,
            quote_depth: 0,
            in_code_block: false,
            link: None,
        }
    }

    fn style(&self) -> Style {
        self.styles
            .iter()
            .fold(Style::default(), |acc, s| acc.patch(*s))
    }

    fn push_style(&mut self, style: Style) {
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    /// Indentation and markers that start every line at the current depth
    fn prefix(&mut self) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        if self.quote_depth > 0 {
            spans.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(Color::DarkGray),
            ));
        }
        if !self.lists.is_empty() {
            let indent = "  ".repeat(self.lists.len() - 1);
            match self.pending_marker.take() {
                Some(marker) => spans.push(Span::styled(
                    format!("{indent}{marker}"),
                    Style::default().fg(Color::Cyan),
                )),
                None => spans.push(Span::raw(format!("{indent}  "))),
            }
        }
        spans
    }

    fn push_text(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        if self.current.is_empty() {
            self.current = self.prefix();
        }
        if let Some((_, seen)) = self.link.as_mut() {
            seen.push_str(text);
        }
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn flush_line(&mut self) {
        if !self.current.is_empty() {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(Line::from(spans));
        }
    }

    fn blank_line(&mut self) {
        self.flush_line();
        if self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            return;
        }
        if !self.lines.is_empty() {
            self.lines.push(Line::default());
        }
    }

    fn end_block(&mut self) {
        if self.lists.is_empty() {
            self.blank_line();
        } else {
            self.flush_line();
        }
    }

    fn code_block_text(&mut self, text: &str) {
        for line in text.lines() {
            let mut spans = self.prefix();
            spans.push(Span::styled(format!("    {line}"), code_style()));
            self.lines.push(Line::from(spans));
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading { level, .. } => {
                self.flush_line();
                self.push_style(heading_style(level));
            }
            Tag::BlockQuote => {
                self.flush_line();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        let mut spans = self.prefix();
                        spans.push(Span::styled(
                            format!("  [{lang}]"),
                            Style::default().fg(Color::DarkGray),
                        ));
                        self.lines.push(Line::from(spans));
                    }
                }
            }
            Tag::List(start) => {
                self.flush_line();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_line();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.pending_marker = Some(marker);
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.push_style(
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                );
                self.link = Some((dest_url.to_string(), String::new()));
            }
            Tag::HtmlBlock => self.flush_line(),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.end_block(),
            TagEnd::Heading(_) => {
                self.pop_style();
                self.end_block();
            }
            TagEnd::BlockQuote => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                if self.quote_depth == 0 {
                    self.end_block();
                }
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.end_block();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => {
                // An item with no text still shows its marker
                if self.pending_marker.is_some() && self.current.is_empty() {
                    self.push_text(" ", Style::default());
                }
                self.flush_line();
            }
            TagEnd::HtmlBlock => self.end_block(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some((dest, text)) = self.link.take() {
                    if !dest.is_empty() && dest != text {
                        self.push_text(
                            &format!(" ({dest})"),
                            Style::default().fg(Color::DarkGray),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.code_block_text(&text);
                } else {
                    let style = self.style();
                    self.push_text(&text, style);
                }
            }
            Event::Code(code) => {
                let style = self.style().patch(code_style());
                self.push_text(&code, style);
            }
            // Raw HTML is shown as written, one terminal line per source line
            Event::Html(html) => {
                let style = self.style();
                for line in html.lines() {
                    self.push_text(line, style);
                    self.flush_line();
                }
            }
            Event::InlineHtml(html) => {
                let style = self.style();
                self.push_text(&html, style);
            }
            Event::SoftBreak => {
                let style = self.style();
                self.push_text(" ", style);
            }
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(RULE_WIDTH),
                    Style::default().fg(Color::DarkGray),
                )));
                self.blank_line();
            }
            Event::TaskListMarker(checked) => {
                let mark = if checked { "[x] " } else { "[ ] " };
                self.push_text(mark, Style::default().fg(Color::Cyan));
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Render markdown into styled lines ready for a `Paragraph`.
pub fn render(text: &str) -> Vec<Line<'static>> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut renderer = Renderer::new();
    for event in Parser::new_ext(text, options) {
        renderer.event(event);
    }
    renderer.finish()
}
