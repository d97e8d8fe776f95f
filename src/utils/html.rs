/// Clean user-supplied text using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) survive while
/// <script>, <iframe> and event-handler attributes are stripped. Applied to
/// comment bodies and blog descriptions before they are stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
