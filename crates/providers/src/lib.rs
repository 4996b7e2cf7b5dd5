pub mod gemini;
pub mod oauth_helper;
pub mod youtube;
