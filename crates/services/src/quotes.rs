//! Motivational quotes shown on the landing screen.

use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

pub static QUOTES: &[Quote] = &[
    Quote {
        text: "You have to dream before your dreams can come true.",
        author: "Dr. A.P.J. Abdul Kalam",
    },
    Quote {
        text: "If you want to shine like a sun, first burn like a sun.",
        author: "Dr. A.P.J. Abdul Kalam",
    },
    Quote {
        text: "Man needs his difficulties because they are necessary to enjoy success.",
        author: "Dr. A.P.J. Abdul Kalam",
    },
    Quote {
        text: "Arise, awake, and stop not till the goal is reached.",
        author: "Swami Vivekananda",
    },
    Quote {
        text: "Take up one idea. Make that one idea your life - think of it, dream of it, live on it.",
        author: "Swami Vivekananda",
    },
    Quote {
        text: "Be the change that you wish to see in the world.",
        author: "Mahatma Gandhi",
    },
    Quote {
        text: "Live as if you were to die tomorrow. Learn as if you were to live forever.",
        author: "Mahatma Gandhi",
    },
    Quote {
        text: "Failure will never overtake me if my determination to succeed is strong enough.",
        author: "Dr. A.P.J. Abdul Kalam",
    },
];

pub fn random() -> &'static Quote {
    // QUOTES is a non-empty static
    QUOTES.choose(&mut rand::thread_rng()).unwrap_or(&QUOTES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_is_from_list() {
        for _ in 0..20 {
            let quote = random();
            assert!(QUOTES.contains(quote));
        }
    }
}
