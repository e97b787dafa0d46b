//! KeyValues text trees.
//!
//! The generic hierarchical format used by VMF, VMT and friends: a class
//! name, quoted `"key" "value"` property lines and nested brace-delimited
//! child classes.
//!
//! https://developer.valvesoftware.com/wiki/KeyValues

/// A single class in a KeyValues tree.
///
/// Property insertion order is preserved so that serialization round-trips;
/// keys are unique per node (setting an existing key overwrites its value in
/// place).
#[derive(Debug, Clone, PartialEq)]
pub struct KVNode {
    class_name: String,
    properties: Vec<(String, String)>,
    children: Vec<KVNode>,
}

impl KVNode {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Sets a property, overwriting in place if the key already exists.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.properties.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.properties.push((name, value)),
        }
    }

    pub fn set_properties<K, V>(&mut self, properties: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: ToString,
    {
        for (k, v) in properties {
            self.set_property(k, v);
        }
    }

    pub fn get_property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn add_child(&mut self, child: KVNode) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[KVNode] {
        &self.children
    }

    pub fn children_by_class_name<'a>(
        &'a self,
        class_name: &'a str,
    ) -> impl Iterator<Item = &'a KVNode> {
        self.children
            .iter()
            .filter(move |c| c.class_name == class_name)
    }

    /// Serializes the full block: class-name line, `{`, body, `}`.
    ///
    /// The exact inverse of [`KVNode::parse`] for well-formed trees.
    pub fn to_text(&self, indent: usize) -> String {
        let pre = "\t".repeat(indent);
        let mut out = format!("{pre}{}\n{pre}{{\n", self.class_name);
        out.push_str(&self.body_text(indent + 1));
        out.push_str(&pre);
        out.push_str("}\n");
        out
    }

    /// Serializes only the body: properties in insertion order, then
    /// children. VMF documents are written this way at the top level, the
    /// root sections appear without an enclosing class.
    pub fn body_text(&self, indent: usize) -> String {
        let pre = "\t".repeat(indent);
        let mut out = String::new();
        for (key, value) in &self.properties {
            out.push_str(&format!("{pre}\"{key}\" \"{value}\"\n"));
        }
        for child in &self.children {
            out.push_str(&child.to_text(indent));
        }
        out
    }

    /// Parses a KeyValues block. The first two non-empty lines are the class
    /// name and its opening brace.
    ///
    /// Parsing is lenient: mismatched braces never fail. An extra closing
    /// brace is clamped at the root, an unterminated block is closed at end
    /// of input. Callers that need strictness must validate the resulting
    /// tree themselves.
    pub fn parse(text: &str) -> KVNode {
        let mut lines = text
            .trim()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty());

        let root = KVNode::new(lines.next().unwrap_or_default());
        // opening brace of the root block
        lines.next();

        let mut stack = vec![root];

        for line in lines {
            let mut tokens = tokenize(line);

            if tokens.len() > 1 {
                let value = tokens.split_off(1).join(" ");
                let key = tokens.pop().unwrap_or_default();
                stack.last_mut().unwrap().set_property(key, value);
                continue;
            }

            match tokens.first().map(String::as_str) {
                None | Some("{") => {}
                Some("}") => {
                    if stack.len() > 1 {
                        let done = stack.pop().unwrap();
                        stack.last_mut().unwrap().add_child(done);
                    } else {
                        log::warn!("unbalanced closing brace in KeyValues text");
                    }
                }
                Some(name) => stack.push(KVNode::new(name)),
            }
        }

        // close any unterminated blocks
        while stack.len() > 1 {
            let done = stack.pop().unwrap();
            stack.last_mut().unwrap().add_child(done);
        }
        stack.pop().unwrap()
    }
}

/// Splits a line into tokens: quoted strings keep embedded spaces, unquoted
/// runs split on single spaces, empty tokens are dropped.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_string = false;

    for c in line.chars() {
        match c {
            '"' => {
                if in_string {
                    tokens.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                in_string = !in_string;
            }
            ' ' if !in_string => tokens.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    tokens.push(current);

    tokens.retain(|t| !t.trim().is_empty());
    tokens
}
