//! The fixed quiz shown when the user asks for the demo.

use crate::model::QuizItem;

/// Five questions about the Rust ownership model.
pub fn demo_quiz() -> Vec<QuizItem> {
    vec![
        QuizItem::new(
            "What happens to a value when its owner goes out of scope?",
            &[
                "It is moved to the heap",
                "It is dropped",
                "It becomes a static",
                "It is copied to the caller",
            ],
            1,
        ),
        QuizItem::new(
            "How many mutable references to a value may exist at the same time?",
            &["Zero", "One", "Two", "Unlimited"],
            1,
        ),
        QuizItem::new(
            "Which trait lets a type be duplicated with a plain bitwise copy?",
            &["Clone", "Send", "Copy", "Sized"],
            2,
        ),
        QuizItem::new(
            "What does the borrow checker guarantee about a reference?",
            &[
                "It never outlives the value it points to",
                "It is always allocated on the stack",
                "It can be sent to any thread",
                "It is never null unless wrapped in Option",
            ],
            0,
        ),
        QuizItem::new(
            "Which smart pointer gives shared ownership across threads?",
            &["Box<T>", "Rc<T>", "Arc<T>", "Cell<T>"],
            2,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_quiz_is_well_formed() {
        let quiz = demo_quiz();
        assert_eq!(quiz.len(), 5);
        for item in &quiz {
            assert!(item.validate().is_ok());
            assert!(item.correct_answer().is_some(), "{}", item.question);
        }
    }

    #[test]
    fn demo_quiz_is_stable() {
        assert_eq!(demo_quiz(), demo_quiz());
    }
}
