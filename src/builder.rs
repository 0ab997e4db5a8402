use crate::ast::{Comment, Command, Node};
use crate::context::Context;

impl Command {
    /// Create a command without parameters, located at `<stdin>` line 1.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: None,
            context: Context::default(),
        }
    }

    /// Set the parameter string.
    #[must_use]
    pub fn with_params(mut self, params: &str) -> Self {
        self.params = Some(params.to_string());
        self
    }

    /// Set the source location.
    #[must_use]
    pub fn at(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Wrap into a [`Node`].
    #[must_use]
    pub fn node(self) -> Node {
        Node::Command(self)
    }
}

impl Comment {
    /// Create a comment with the given text (without the leading `#`).
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            context: Context::default(),
        }
    }

    /// Empty line.
    #[must_use]
    pub fn blank() -> Self {
        Self::new("")
    }

    /// Set the source location.
    #[must_use]
    pub fn at(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Wrap into a [`Node`].
    #[must_use]
    pub fn node(self) -> Node {
        Node::Comment(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_defaults() {
        let cmd = Command::new("selinux-relabel");
        assert_eq!(cmd.name, "selinux-relabel");
        assert_eq!(cmd.params, None);
        assert_eq!(cmd.context, Context::new("<stdin>", 1));
    }

    #[test]
    fn command_chain() {
        let ctx = Context::new("main", 7);
        let node = Command::new("run").with_params("/x").at(ctx.clone()).node();
        assert_eq!(
            node,
            Node::Command(Command {
                name: "run".to_string(),
                params: Some("/x".to_string()),
                context: ctx,
            })
        );
    }

    #[test]
    fn comment_chain() {
        let node = Comment::new(" hi").at(Context::new("f", 2)).node();
        assert!(matches!(&node, Node::Comment(c) if c.text == " hi"));
        assert_eq!(node.context().line, 2);
        assert!(Comment::blank().text.is_empty());
    }
}
