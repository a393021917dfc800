/// Display name for a script identifier reported by the chat API.
///
/// Returns `None` for `unknown`, which the server sends when detection failed.
pub fn script_label(detected: &str) -> Option<String> {
    let label = match detected {
        "unknown" => return None,
        "latin" => "Latin",
        "romanized_indic" => "Romanized",
        "romanized_hindi" => "Romanized Hindi",
        "romanized_marathi" => "Romanized Marathi",
        "devanagari" => "देवनागरी",
        "devanagari_hindi" => "देवनागरी हिंदी",
        "devanagari_marathi" => "देवनागरी मराठी",
        other => other,
    };
    Some(label.to_string())
}
