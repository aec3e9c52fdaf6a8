//! Conversation history - ordered messages plus token-budget trimming.
//!
//! The conversation is a value the caller supplies on every request; the
//! engine holds no history between requests. Insertion order is meaningful
//! and never reordered. Trimming removes whole message *groups* from the
//! oldest non-pinned end: an assistant message that requested tool calls is
//! removed only together with all of its paired tool-result messages, so a
//! provider never sees an orphaned call or result.

use std::collections::HashSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::message::{Message, MessageRole};

/// Errors raised by conversation construction and trimming.
#[derive(Debug, Clone, Error)]
pub enum ConversationError {
    /// A tool message referenced a call id with no pending tool call.
    #[error("tool message references unknown tool call id '{tool_call_id}'")]
    DanglingToolResult { tool_call_id: String },

    /// The history exceeds the budget even after all removable groups are gone.
    #[error("conversation estimated at {estimated} tokens exceeds the {budget} token budget after trimming")]
    ContextTooLarge { estimated: u32, budget: u32 },
}

/// Ordered conversation history.
///
/// Append is committed per fully-formed message only; a rejected append
/// leaves the history untouched. The leading system message, if present,
/// is pinned and survives every trim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a conversation from caller-supplied messages, validating
    /// tool-result pairing along the way.
    pub fn from_messages(
        messages: impl IntoIterator<Item = Message>,
    ) -> Result<Self, ConversationError> {
        let mut conversation = Self::new();
        for message in messages {
            conversation.append(message)?;
        }
        Ok(conversation)
    }

    /// Appends a message to the history.
    ///
    /// A tool message is accepted only when its `tool_call_id` matches a
    /// still-unanswered call issued by the immediately preceding assistant
    /// message; anything else fails with
    /// [`ConversationError::DanglingToolResult`].
    pub fn append(&mut self, message: Message) -> Result<(), ConversationError> {
        if message.role == MessageRole::Tool {
            let id = message.tool_call_id.as_deref().unwrap_or_default();
            if !self.pending_call_ids().iter().any(|pending| pending == id) {
                return Err(ConversationError::DanglingToolResult {
                    tool_call_id: id.to_string(),
                });
            }
        }
        self.messages.push(message);
        Ok(())
    }

    /// Returns the ordered messages.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Consumes self and returns the messages.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the history is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns true if the history starts with a system message.
    pub fn has_system_message(&self) -> bool {
        matches!(self.messages.first(), Some(m) if m.role == MessageRole::System)
    }

    /// Prepends a system message unless one is already pinned at the front.
    pub fn ensure_system_prompt(&mut self, content: &str) {
        if !self.has_system_message() {
            self.messages.insert(0, Message::system(content));
        }
    }

    /// Content of the most recent assistant message with non-empty text.
    pub fn last_assistant_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant && !m.content.is_empty())
            .map(|m| m.content.as_str())
    }

    /// Estimated token size of the whole history.
    ///
    /// Sum of [`Message::estimated_tokens`]; see there for the heuristic.
    pub fn estimated_tokens(&self) -> u32 {
        self.messages.iter().map(Message::estimated_tokens).sum()
    }

    /// Trims the history until the estimated size fits `max_tokens`.
    ///
    /// Removes the oldest non-pinned group on each pass. The pinned system
    /// message and the most recent user turn are never removed; if the
    /// budget is still exceeded once only those remain, fails with
    /// [`ConversationError::ContextTooLarge`].
    pub fn trim_to_budget(&mut self, max_tokens: u32) -> Result<(), ConversationError> {
        while self.estimated_tokens() > max_tokens {
            match self.oldest_removable_group() {
                Some(range) => {
                    self.messages.drain(range);
                }
                None => {
                    return Err(ConversationError::ContextTooLarge {
                        estimated: self.estimated_tokens(),
                        budget: max_tokens,
                    });
                }
            }
        }
        Ok(())
    }

    /// Call ids issued by the trailing assistant message that have not yet
    /// received a tool-result message.
    fn pending_call_ids(&self) -> Vec<String> {
        let mut answered: HashSet<&str> = HashSet::new();
        let mut index = self.messages.len();
        while index > 0 && self.messages[index - 1].role == MessageRole::Tool {
            if let Some(id) = self.messages[index - 1].tool_call_id.as_deref() {
                answered.insert(id);
            }
            index -= 1;
        }
        if index == 0 {
            return Vec::new();
        }
        let candidate = &self.messages[index - 1];
        if candidate.role != MessageRole::Assistant {
            return Vec::new();
        }
        candidate
            .tool_calls
            .iter()
            .filter(|call| !answered.contains(call.id()))
            .map(|call| call.id().to_string())
            .collect()
    }

    /// Message groups in order: a plain message is its own group; an
    /// assistant tool-calls message groups with the contiguous tool
    /// messages that follow it.
    fn groups(&self) -> Vec<Range<usize>> {
        let mut groups = Vec::new();
        let mut index = 0;
        while index < self.messages.len() {
            let start = index;
            index += 1;
            if self.messages[start].has_tool_calls() {
                while index < self.messages.len()
                    && self.messages[index].role == MessageRole::Tool
                {
                    index += 1;
                }
            }
            groups.push(start..index);
        }
        groups
    }

    /// The first group that is neither the pinned system message nor the
    /// most recent user turn.
    fn oldest_removable_group(&self) -> Option<Range<usize>> {
        let groups = self.groups();
        let last_user_group = groups
            .iter()
            .rposition(|g| self.messages[g.start].role == MessageRole::User);
        groups.iter().enumerate().find_map(|(i, group)| {
            let pinned =
                group.start == 0 && self.messages[0].role == MessageRole::System;
            let protected = last_user_group == Some(i);
            if pinned || protected {
                None
            } else {
                Some(group.clone())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::message::ToolCallRequest;

    fn tool_round(conversation: &mut Conversation, id: &str, name: &str, result: &str) {
        conversation
            .append(Message::assistant_tool_calls(
                "",
                vec![ToolCallRequest::new(id, name, "{}")],
            ))
            .unwrap();
        conversation.append(Message::tool(id, result)).unwrap();
    }

    #[test]
    fn append_accepts_plain_messages() {
        let mut conversation = Conversation::new();
        conversation.append(Message::system("prompt")).unwrap();
        conversation.append(Message::user("hello")).unwrap();
        conversation.append(Message::assistant("hi")).unwrap();
        assert_eq!(conversation.len(), 3);
    }

    #[test]
    fn append_rejects_dangling_tool_result() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("hello")).unwrap();

        let err = conversation
            .append(Message::tool("call-9", "orphan"))
            .unwrap_err();
        assert!(matches!(
            err,
            ConversationError::DanglingToolResult { tool_call_id } if tool_call_id == "call-9"
        ));
        // rejected append leaves history untouched
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn append_accepts_tool_result_for_pending_call() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("q")).unwrap();
        conversation
            .append(Message::assistant_tool_calls(
                "",
                vec![
                    ToolCallRequest::new("a", "get_customers", "{}"),
                    ToolCallRequest::new("b", "get_employees", "{}"),
                ],
            ))
            .unwrap();

        conversation.append(Message::tool("b", "r1")).unwrap();
        conversation.append(Message::tool("a", "r2")).unwrap();
        // both calls answered, a third result has nothing to pair with
        assert!(conversation.append(Message::tool("a", "again")).is_err());
    }

    #[test]
    fn append_rejects_duplicate_answer_for_same_call() {
        let mut conversation = Conversation::new();
        conversation
            .append(Message::assistant_tool_calls(
                "",
                vec![ToolCallRequest::new("a", "get_customers", "{}")],
            ))
            .unwrap();
        conversation.append(Message::tool("a", "r")).unwrap();
        assert!(conversation.append(Message::tool("a", "r2")).is_err());
    }

    #[test]
    fn ensure_system_prompt_prepends_once() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("q")).unwrap();
        conversation.ensure_system_prompt("first");
        conversation.ensure_system_prompt("second");

        assert_eq!(conversation.messages()[0].content, "first");
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn trim_removes_oldest_non_pinned_messages_first() {
        let mut conversation = Conversation::new();
        conversation.append(Message::system("pinned")).unwrap();
        conversation.append(Message::user("old question")).unwrap();
        conversation.append(Message::assistant("old answer")).unwrap();
        conversation.append(Message::user("new question")).unwrap();

        // budget fits system + latest user turn only
        let budget = conversation.messages()[0].estimated_tokens()
            + conversation.messages()[3].estimated_tokens();
        conversation.trim_to_budget(budget).unwrap();

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0].content, "pinned");
        assert_eq!(conversation.messages()[1].content, "new question");
    }

    #[test]
    fn trim_never_splits_tool_call_group() {
        let mut conversation = Conversation::new();
        conversation.append(Message::system("pinned")).unwrap();
        conversation.append(Message::user("q1")).unwrap();
        tool_round(&mut conversation, "call-1", "get_sales_invoices", "rows");
        conversation.append(Message::assistant("a1")).unwrap();
        conversation.append(Message::user("q2")).unwrap();

        // force removal of at least the tool-call group
        conversation.trim_to_budget(20).unwrap();

        let messages = conversation.messages();
        let has_call = messages.iter().any(Message::has_tool_calls);
        let has_result = messages.iter().any(|m| m.role == MessageRole::Tool);
        assert_eq!(has_call, has_result, "call/result pair was split: {messages:?}");
    }

    #[test]
    fn trim_fails_when_last_user_turn_alone_exceeds_budget() {
        let mut conversation = Conversation::new();
        conversation.append(Message::system("pinned")).unwrap();
        conversation
            .append(Message::user("a very long question with far too many words to fit"))
            .unwrap();

        let err = conversation.trim_to_budget(5).unwrap_err();
        assert!(matches!(err, ConversationError::ContextTooLarge { budget: 5, .. }));
        // nothing protected was removed
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn trim_is_noop_under_budget() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("short")).unwrap();
        let before = conversation.clone();
        conversation.trim_to_budget(1000).unwrap();
        assert_eq!(conversation, before);
    }

    #[test]
    fn last_assistant_content_skips_empty_tool_call_messages() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("q")).unwrap();
        conversation.append(Message::assistant("partial answer")).unwrap();
        tool_round(&mut conversation, "c1", "get_customers", "rows");

        assert_eq!(conversation.last_assistant_content(), Some("partial answer"));
    }

    #[test]
    fn from_messages_validates_pairing() {
        let ok = Conversation::from_messages(vec![
            Message::user("q"),
            Message::assistant_tool_calls("", vec![ToolCallRequest::new("x", "t", "{}")]),
            Message::tool("x", "r"),
        ]);
        assert!(ok.is_ok());

        let bad = Conversation::from_messages(vec![
            Message::user("q"),
            Message::tool("x", "r"),
        ]);
        assert!(bad.is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// One logical turn in a generated conversation.
        #[derive(Debug, Clone)]
        enum Turn {
            User(usize),
            Assistant(usize),
            ToolRound(usize),
        }

        fn words(n: usize) -> String {
            vec!["word"; n].join(" ")
        }

        fn turn_strategy() -> impl Strategy<Value = Turn> {
            prop_oneof![
                (1usize..30).prop_map(Turn::User),
                (1usize..30).prop_map(Turn::Assistant),
                (1usize..4).prop_map(Turn::ToolRound),
            ]
        }

        fn build(turns: &[Turn]) -> Conversation {
            let mut conversation = Conversation::new();
            conversation.append(Message::system("pinned prompt")).unwrap();
            conversation.append(Message::user("opening question")).unwrap();
            for (turn_index, turn) in turns.iter().enumerate() {
                match turn {
                    Turn::User(n) => {
                        conversation.append(Message::user(words(*n))).unwrap();
                    }
                    Turn::Assistant(n) => {
                        conversation.append(Message::assistant(words(*n))).unwrap();
                    }
                    Turn::ToolRound(calls) => {
                        let requests: Vec<_> = (0..*calls)
                            .map(|i| {
                                ToolCallRequest::new(
                                    format!("call-{turn_index}-{i}"),
                                    "get_customers",
                                    "{}",
                                )
                            })
                            .collect();
                        conversation
                            .append(Message::assistant_tool_calls("", requests.clone()))
                            .unwrap();
                        for request in &requests {
                            conversation
                                .append(Message::tool(request.id(), words(5)))
                                .unwrap();
                        }
                    }
                }
            }
            conversation
        }

        proptest! {
            #[test]
            fn trim_preserves_pin_and_groups(
                turns in proptest::collection::vec(turn_strategy(), 0..12),
                budget in 10u32..600,
            ) {
                let mut conversation = build(&turns);
                let result = conversation.trim_to_budget(budget);

                // pinned system message always survives
                prop_assert_eq!(conversation.messages()[0].role, MessageRole::System);

                // every tool-calls message keeps exactly its paired results
                let messages = conversation.messages();
                let mut i = 0;
                while i < messages.len() {
                    if messages[i].has_tool_calls() {
                        let expected = messages[i].tool_calls.len();
                        for offset in 1..=expected {
                            prop_assert!(i + offset < messages.len());
                            prop_assert_eq!(messages[i + offset].role, MessageRole::Tool);
                        }
                        i += expected + 1;
                    } else {
                        prop_assert_ne!(messages[i].role, MessageRole::Tool);
                        i += 1;
                    }
                }

                if result.is_ok() {
                    prop_assert!(conversation.estimated_tokens() <= budget);
                } else {
                    prop_assert!(conversation.estimated_tokens() > budget);
                }
            }
        }
    }
}
