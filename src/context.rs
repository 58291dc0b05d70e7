//! Request assembly for tutor conversations.
//!
//! A request is the system persona, then the learner's recent exchanges
//! (oldest first), then the new prompt.

use crate::llm::ChatMessage;
use crate::memory::ConversationMemory;
use crate::system_prompt::{build_tutor_system_prompt, PromptContext};

pub struct ConversationContext;

impl ConversationContext {
    pub fn build_messages(
        memory: &ConversationMemory,
        user_id: &str,
        context: &PromptContext,
        prompt: &str,
    ) -> Vec<ChatMessage> {
        let history = memory.history(user_id);
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(build_tutor_system_prompt(context)));
        messages.extend(history);
        messages.push(ChatMessage::user(prompt));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_context_retrieval() {
        let memory = ConversationMemory::new(20, 10);
        memory.record_exchange("7", "What is a closure?", "A function plus its scope.");

        let messages = ConversationContext::build_messages(
            &memory,
            "7",
            &PromptContext::topic("JavaScript", 50),
            "Give me an example",
        );

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Current Topic: JavaScript"));
        assert_eq!(messages[1], ChatMessage::user("What is a closure?"));
        assert_eq!(messages[3], ChatMessage::user("Give me an example"));
    }

    #[test]
    fn test_unknown_user_gets_no_history() {
        let memory = ConversationMemory::new(20, 10);
        let messages = ConversationContext::build_messages(
            &memory,
            "nobody",
            &PromptContext::default(),
            "hi",
        );
        assert_eq!(messages.len(), 2);
    }
}
