//! HTML rendering of a session.
//!
//! Every request renders the complete history from scratch; there is no
//! partial update.

use chat_types::Role;
use minijinja::{Environment, context};
use serde::Serialize;

use crate::session::{ChatSession, SessionTurn};

const CHAT_TEMPLATE: &str = include_str!("../templates/chat.html");

/// Template-facing view of a [`SessionTurn`].
#[derive(Debug, Serialize)]
struct TurnView<'a> {
    sender: Role,
    label: &'static str,
    text: &'a str,
}

impl<'a> From<&'a SessionTurn> for TurnView<'a> {
    fn from(turn: &'a SessionTurn) -> Self {
        let label = match turn.sender {
            Role::User => "🧑 You",
            Role::Bot => "🤖 Bot",
        };
        Self {
            sender: turn.sender,
            label,
            text: &turn.text,
        }
    }
}

#[derive(Debug)]
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        // The `.html` suffix turns on HTML auto-escaping.
        env.add_template("chat.html", CHAT_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the full page for `session`.
    pub fn page(&self, title: &str, session: &ChatSession) -> Result<String, minijinja::Error> {
        let turns: Vec<TurnView<'_>> = session.messages().iter().map(TurnView::from).collect();
        self.env.get_template("chat.html")?.render(context! {
            title => title,
            turns => turns,
            sending => session.is_sending(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn render(session: &ChatSession) -> String {
        Renderer::new().unwrap().page("Custom Chatbot", session).unwrap()
    }

    #[test]
    fn turns_are_labelled_in_order() {
        let mut session = ChatSession::default();
        session.begin_submit("hello");
        session.finish_submit("hi there".into());

        let html = render(&session);
        let you = html.find("🧑 You:</span> hello").unwrap();
        let bot = html.find("🤖 Bot:</span> hi there").unwrap();
        assert!(you < bot);
        assert!(html.contains("<title>Custom Chatbot</title>"));
    }

    #[test]
    fn text_is_escaped() {
        let mut session = ChatSession::default();
        session.begin_submit("<script>alert(1)</script>");

        let html = render(&session);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn input_is_disabled_only_while_sending() {
        let mut session = ChatSession::default();
        assert!(!render(&session).contains(" disabled"));

        session.begin_submit("hello");
        let pending = render(&session);
        assert!(pending.contains(" disabled"));
        assert!(pending.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn rendering_is_repeatable() {
        let mut session = ChatSession::default();
        session.begin_submit("hello");
        session.finish_submit("hi".into());
        assert_eq!(render(&session), render(&session));
    }
}
