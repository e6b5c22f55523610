use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthChar;

use crate::app::App;
use crate::chat::{Message, Origin};
use crate::markdown;

const TITLE: &str = "🌿 AgriChat Buddy";
const SUBTITLE: &str = "Your AI Partner for Sustainable Farming";
const WELCOME_TITLE: &str = "👋 Welcome to AgriChat Buddy";
const WELCOME_TEXT: &str = "Ask me anything about organic farming, soil health, irrigation, \
                            or sustainable agriculture!";
const PLACEHOLDER: &str = "Type your question here...";

fn user_label() -> Span<'static> {
    Span::styled("You:", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
}

fn bot_label() -> Span<'static> {
    Span::styled("AgriChat:", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat history, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(vec![
        Line::from(Span::styled(TITLE, Style::default().fg(Color::Green).bold())).centered(),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(Color::Gray))).centered(),
    ])
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn welcome_lines() -> Vec<Line<'static>> {
    vec![
        Line::default(),
        Line::from(Span::styled(
            WELCOME_TITLE,
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::default(),
        Line::from(Span::styled(WELCOME_TEXT, Style::default().fg(Color::Gray))).centered(),
        Line::default(),
    ]
}

fn message_lines(msg: &Message, lines: &mut Vec<Line<'static>>) {
    match msg.origin {
        Origin::User => {
            lines.push(Line::from(user_label()));
            // User text is shown exactly as typed
            for line in msg.text.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        Origin::Bot => {
            lines.push(Line::from(bot_label()));
            lines.extend(markdown::render(&msg.text));
        }
    }
    lines.push(Line::default());
}

/// Everything shown in the chat box, top to bottom.
fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let conversation = &app.conversation;
    let mut lines: Vec<Line<'static>> = Vec::new();

    if conversation.is_empty() {
        lines.extend(welcome_lines());
    } else {
        for msg in conversation.messages() {
            message_lines(msg, &mut lines);
        }
    }

    if conversation.is_awaiting_reply() {
        lines.push(Line::from(bot_label()));
        lines.push(Line::from(vec![
            Span::styled(app.spinner(), Style::default().fg(Color::Green)),
            Span::styled(
                " Thinking...",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Conversation ");

    let inner_width = area.width.saturating_sub(2);
    app.chat_height = area.height.saturating_sub(2);

    let paragraph = Paragraph::new(Text::from(chat_lines(app))).wrap(Wrap { trim: false });

    // Keep the scroll range in step with what actually fits
    let total_lines = u16::try_from(paragraph.line_count(inner_width)).unwrap_or(u16::MAX);
    app.chat_max_scroll = total_lines.saturating_sub(app.chat_height);
    app.chat_scroll = app.chat_scroll.min(app.chat_max_scroll);

    let paragraph = paragraph.block(block).scroll((app.chat_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let conversation = &app.conversation;
    let border_color = if conversation.is_awaiting_reply() {
        Color::DarkGray
    } else {
        Color::Yellow
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Ask ")
        .title_top(Line::from(" Enter: Send ").right_aligned());

    let (visible_text, cursor_x) = input_window(
        conversation.draft(),
        conversation.cursor(),
        area.width.saturating_sub(2),
    );

    let input = if conversation.draft().is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(block), area);
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

/// The slice of the draft that fits in `width` cells with the cursor in
/// view, and the cursor's column within it. Columns are display cells, so
/// wide characters count twice.
fn input_window(draft: &str, cursor: usize, width: u16) -> (String, u16) {
    let width = usize::from(width);
    let widths: Vec<usize> = draft.chars().map(|c| c.width().unwrap_or(0)).collect();
    let cursor = cursor.min(widths.len());

    // Drop characters from the left until the cursor cell fits
    let mut offset = 0;
    while offset < cursor && widths[offset..cursor].iter().sum::<usize>() >= width {
        offset += 1;
    }

    let mut used = 0;
    let visible: String = draft
        .chars()
        .zip(&widths)
        .skip(offset)
        .take_while(|(_, w)| {
            used += **w;
            used <= width
        })
        .map(|(c, _)| c)
        .collect();

    let cursor_x: usize = widths[offset..cursor].iter().sum();
    (visible, u16::try_from(cursor_x).unwrap_or(u16::MAX))
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.conversation.is_awaiting_reply() {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" READY ", Style::default().bg(Color::Green).fg(Color::Black))
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::raw(" "),
        Span::styled(app.endpoint().to_string(), Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled(
            "Enter send · ↑↓/PgUp/PgDn scroll · Ctrl+U clear · Esc quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatClient;
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn new_app() -> App {
        App::new(ChatClient::new("http://127.0.0.1:8002"))
    }

    fn draw(app: &mut App, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn cell_symbols(buffer: &Buffer) -> Vec<Vec<String>> {
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol().to_string()).collect())
            .collect()
    }

    fn screen_text(buffer: &Buffer) -> String {
        cell_symbols(buffer)
            .into_iter()
            .map(|row| row.concat())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Position of the first cell of an ASCII string on screen
    fn find(buffer: &Buffer, text: &str) -> Option<(usize, usize)> {
        let rows = cell_symbols(buffer);
        let wanted: Vec<String> = text.chars().map(String::from).collect();
        for (y, row) in rows.iter().enumerate() {
            for x in 0..row.len() {
                if row[x..].starts_with(&wanted) {
                    return Some((x, y));
                }
            }
        }
        None
    }

    fn answered(app: &mut App, question: &str, reply: &str) {
        app.conversation.set_draft(question);
        app.conversation.submit();
        app.conversation.resolve(Ok(reply.to_string()));
    }

    #[test]
    fn empty_log_shows_welcome_panel() {
        let mut app = new_app();
        let screen = screen_text(&draw(&mut app, 100, 20));

        assert!(screen.contains("Welcome to AgriChat Buddy"));
        assert!(screen.contains("Type your question here..."));
        assert!(!screen.contains("You:"));
    }

    #[test]
    fn messages_replace_welcome_panel() {
        let mut app = new_app();
        answered(&mut app, "How do I rotate crops?", "**Rotate** legumes then cereals.");

        let buffer = draw(&mut app, 100, 20);
        let screen = screen_text(&buffer);

        assert!(!screen.contains("Welcome to AgriChat Buddy"));
        assert!(screen.contains("How do I rotate crops?"));
        assert!(screen.contains("Rotate legumes then cereals."));

        let (x, y) = find(&buffer, "Rotate legumes").unwrap();
        let width = buffer.area.width as usize;
        let rotate = &buffer.content[y * width + x];
        assert!(rotate.modifier.contains(Modifier::BOLD));
        let legumes = &buffer.content[y * width + x + "Rotate ".len()];
        assert!(!legumes.modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn user_text_is_not_formatted() {
        let mut app = new_app();
        answered(&mut app, "is **this** bold?", "no");

        let screen = screen_text(&draw(&mut app, 100, 20));
        assert!(screen.contains("is **this** bold?"));
    }

    #[test]
    fn loading_indicator_follows_last_message() {
        let mut app = new_app();
        app.conversation.set_draft("Best cover crop?");
        app.conversation.submit();

        let buffer = draw(&mut app, 100, 20);
        let (_, question_row) = find(&buffer, "Best cover crop?").unwrap();
        let (_, thinking_row) = find(&buffer, "Thinking...").unwrap();

        assert!(thinking_row > question_row);
        assert!(screen_text(&buffer).contains("WAITING"));
    }

    #[test]
    fn no_loading_indicator_when_idle() {
        let mut app = new_app();
        answered(&mut app, "q", "a");

        let screen = screen_text(&draw(&mut app, 100, 20));
        assert!(!screen.contains("Thinking..."));
        assert!(screen.contains("READY"));
    }

    #[test]
    fn long_history_sets_scroll_range() {
        let mut app = new_app();
        for i in 0..10 {
            answered(&mut app, &format!("question {i}"), &format!("answer {i}"));
        }

        draw(&mut app, 80, 20);

        // 10 exchanges of 6 lines each; the box is 20 rows minus header, input, footer, borders
        assert_eq!(app.chat_height, 12);
        assert_eq!(app.chat_max_scroll, 60 - 12);
    }

    #[test]
    fn newest_message_is_visible_after_easing() {
        let mut app = new_app();
        for i in 0..10 {
            answered(&mut app, &format!("question {i}"), &format!("answer {i}"));
        }

        draw(&mut app, 80, 20);
        for _ in 0..8 {
            app.tick();
        }
        let screen = screen_text(&draw(&mut app, 80, 20));

        assert!(screen.contains("answer 9"));
        assert!(!screen.contains("question 0"));
    }

    #[test]
    fn input_cursor_counts_display_cells() {
        let (visible, cursor_x) = input_window("🌿🌿🌿🌿", 4, 98);
        assert_eq!(visible, "🌿🌿🌿🌿");
        assert_eq!(cursor_x, 8);
    }

    #[test]
    fn input_scrolls_wide_text_to_keep_cursor_visible() {
        let (visible, cursor_x) = input_window("🌿🌿🌿🌿", 4, 5);
        assert_eq!(visible, "🌿🌿");
        assert_eq!(cursor_x, 4);
    }

    #[test]
    fn input_never_overflows_the_box() {
        let (visible, cursor_x) = input_window("田田田田田", 0, 5);
        assert_eq!(visible, "田田");
        assert_eq!(cursor_x, 0);
    }

    #[test]
    fn input_scrolls_ascii_text() {
        let (visible, cursor_x) = input_window("abcdefgh", 8, 4);
        assert_eq!(visible, "fgh");
        assert_eq!(cursor_x, 3);
    }
}
