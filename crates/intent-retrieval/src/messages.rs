//! Localized response strings.

use intent_types::Language;

/// Prompt for blank input.
pub fn empty_input(language: Language) -> String {
    match language {
        Language::Zh => "请输入您的问题或指令。",
        Language::En => "Please provide some input.",
        Language::Ja => "入力してください。",
        Language::Ko => "입력해 주세요.",
        Language::Es => "Por favor, escribe algo.",
        Language::Fr => "Veuillez saisir une demande.",
        Language::De => "Bitte gib etwas ein.",
    }
    .to_string()
}

/// Generic failure when nothing matched.
pub fn not_understood(language: Language) -> String {
    match language {
        Language::Zh => "抱歉，我不明白您的意思。",
        Language::En => "Sorry, I didn't understand that.",
        Language::Ja => "すみません、よく分かりませんでした。",
        Language::Ko => "죄송합니다. 이해하지 못했습니다.",
        Language::Es => "Lo siento, no lo he entendido.",
        Language::Fr => "Désolé, je n'ai pas compris.",
        Language::De => "Entschuldigung, das habe ich nicht verstanden.",
    }
    .to_string()
}

/// Failure while embedding or searching.
pub fn query_failed(language: Language) -> String {
    match language {
        Language::Zh => "处理您的请求时出错，请重试。",
        Language::En => "Something went wrong while processing your request. Please try again.",
        Language::Ja => "リクエストの処理中にエラーが発生しました。もう一度お試しください。",
        Language::Ko => "요청을 처리하는 중 오류가 발생했습니다. 다시 시도해 주세요.",
        Language::Es => "Se produjo un error al procesar la solicitud. Inténtalo de nuevo.",
        Language::Fr => "Une erreur s'est produite. Veuillez réessayer.",
        Language::De => "Bei der Verarbeitung ist ein Fehler aufgetreten. Bitte versuche es erneut.",
    }
    .to_string()
}

/// "Did you mean ...?" for a fuzzy candidate.
pub fn fuzzy_suggestion(language: Language, text: &str) -> String {
    match language {
        Language::Zh => format!("没有找到完全匹配。您是想说“{}”吗？", text),
        Language::En => format!("No exact match. Did you mean \"{}\"?", text),
        Language::Ja => format!("一致するものがありません。「{}」のことですか？", text),
        Language::Ko => format!("정확히 일치하는 항목이 없습니다. \"{}\"을(를) 말씀하신 건가요?", text),
        Language::Es => format!("No hay coincidencia exacta. ¿Quisiste decir \"{}\"?", text),
        Language::Fr => format!("Aucune correspondance exacte. Vouliez-vous dire « {} » ?", text),
        Language::De => format!("Keine genaue Übereinstimmung. Meintest du \"{}\"?", text),
    }
}

fn parameter_label(language: Language, parameter: &str) -> String {
    match (parameter, language) {
        ("deviceName", Language::Zh) => "设备名称".to_string(),
        ("deviceName", Language::En) => "a device name".to_string(),
        ("deviceName", Language::Ja) => "デバイス名".to_string(),
        ("deviceName", Language::Ko) => "기기 이름".to_string(),
        ("deviceName", Language::Es) => "el nombre del dispositivo".to_string(),
        ("deviceName", Language::Fr) => "le nom de l'appareil".to_string(),
        ("deviceName", Language::De) => "einen Gerätenamen".to_string(),
        (other, _) => other.to_string(),
    }
}

/// Ask the user to supply a parameter the action needs.
pub fn missing_parameter(language: Language, parameter: &str) -> String {
    let label = parameter_label(language, parameter);
    match language {
        Language::Zh => format!("请指定{}。", label),
        Language::En => format!("Please specify {}.", label),
        Language::Ja => format!("{}を指定してください。", label),
        Language::Ko => format!("{}을(를) 지정해 주세요.", label),
        Language::Es => format!("Por favor, indica {}.", label),
        Language::Fr => format!("Veuillez préciser {}.", label),
        Language::De => format!("Bitte gib {} an.", label),
    }
}

/// Matched action with no registered handler.
pub fn not_implemented(language: Language, action: &str) -> String {
    match language {
        Language::Zh => format!("功能“{}”尚未实现。", action),
        Language::En => format!("The action \"{}\" is not implemented yet.", action),
        Language::Ja => format!("「{}」はまだ実装されていません。", action),
        Language::Ko => format!("\"{}\" 기능은 아직 구현되지 않았습니다.", action),
        Language::Es => format!("La acción \"{}\" aún no está implementada.", action),
        Language::Fr => format!("L'action « {} » n'est pas encore disponible.", action),
        Language::De => format!("Die Aktion \"{}\" ist noch nicht implementiert.", action),
    }
}
