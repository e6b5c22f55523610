use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') => app.should_quit = true,
            KeyCode::Char('u') => app.conversation.set_draft(""),
            KeyCode::Char('a') => app.conversation.cursor_home(),
            KeyCode::Char('e') => app.conversation.cursor_end(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => app.submit(),

        // Draft editing
        KeyCode::Backspace => app.conversation.backspace(),
        KeyCode::Delete => app.conversation.delete(),
        KeyCode::Left => app.conversation.cursor_left(),
        KeyCode::Right => app.conversation.cursor_right(),
        KeyCode::Home => app.conversation.cursor_home(),
        KeyCode::End => app.conversation.cursor_end(),
        KeyCode::Char(c) => app.conversation.insert_char(c),

        // Chat history scrolling
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => {
            let lines = app.half_page();
            app.scroll_up(lines);
        }
        KeyCode::PageDown => {
            let lines = app.half_page();
            app.scroll_down(lines);
        }
        _ => {}
    }
}

/// The input is a single line, so pasted line breaks become spaces.
fn handle_paste(app: &mut App, text: &str) {
    for c in text.chars() {
        match c {
            '\r' => {}
            '\n' | '\t' => app.conversation.insert_char(' '),
            c => app.conversation.insert_char(c),
        }
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL_LINES),
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL_LINES),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatClient;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn new_app() -> App {
        App::new(ChatClient::new("http://127.0.0.1:9"))
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn typing_builds_the_draft() {
        let mut app = new_app();
        type_text(&mut app, "mulch");
        handle_event(&mut app, key(KeyCode::Left));
        handle_event(&mut app, key(KeyCode::Backspace));

        assert_eq!(app.conversation.draft(), "mulh");
        assert!(app.conversation.is_empty());
    }

    #[tokio::test]
    async fn enter_submits_the_draft() {
        let mut app = new_app();
        type_text(&mut app, "When to sow wheat?");
        handle_event(&mut app, key(KeyCode::Enter));

        assert_eq!(app.conversation.messages().len(), 1);
        assert_eq!(app.conversation.draft(), "");
        assert!(app.conversation.is_awaiting_reply());

        app.wait_for_reply().await;
    }

    #[test]
    fn enter_on_blank_draft_does_nothing() {
        let mut app = new_app();
        type_text(&mut app, "   ");
        handle_event(&mut app, key(KeyCode::Enter));

        assert!(app.conversation.is_empty());
        assert_eq!(app.conversation.draft(), "   ");
        assert!(!app.conversation.is_awaiting_reply());
    }

    #[test]
    fn ctrl_c_and_esc_quit() {
        let mut app = new_app();
        handle_event(&mut app, ctrl('c'));
        assert!(app.should_quit);

        let mut app = new_app();
        handle_event(&mut app, key(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn ctrl_u_clears_the_draft() {
        let mut app = new_app();
        type_text(&mut app, "typo");
        handle_event(&mut app, ctrl('u'));
        assert_eq!(app.conversation.draft(), "");
        assert_eq!(app.conversation.cursor(), 0);
    }

    #[test]
    fn paste_flattens_newlines() {
        let mut app = new_app();
        handle_event(&mut app, AppEvent::Paste("line one\r\nline two".to_string()));
        assert_eq!(app.conversation.draft(), "line one line two");
    }

    #[test]
    fn arrows_scroll_the_history() {
        let mut app = new_app();
        app.chat_max_scroll = 20;
        app.chat_scroll = 20;
        app.chat_height = 10;

        handle_event(&mut app, key(KeyCode::PageUp));
        assert_eq!(app.chat_scroll, 15);
        handle_event(&mut app, key(KeyCode::Up));
        assert_eq!(app.chat_scroll, 14);
        handle_event(&mut app, key(KeyCode::Down));
        assert_eq!(app.chat_scroll, 15);
        assert!(!app.follow_bottom);
        handle_event(&mut app, key(KeyCode::PageDown));
        assert_eq!(app.chat_scroll, 20);
        assert!(app.follow_bottom);
    }
}
