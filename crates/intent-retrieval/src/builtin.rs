//! Built-in template catalog for the demo user/device actions.

use intent_types::{Language, Template};

use crate::catalog::TemplateCatalog;

pub const GET_USER_POINTS: &str = "getUserPoints";
pub const GET_USER_PROFILE: &str = "getUserProfile";
pub const LIST_DEVICES: &str = "listDevices";
pub const ADD_DEVICE: &str = "addDevice";
pub const REMOVE_DEVICE: &str = "removeDevice";
pub const GET_DEVICE_STATUS: &str = "getDeviceStatus";
pub const SHOW_HELP: &str = "showHelp";

/// Parameter name used by the device actions
pub const DEVICE_NAME: &str = "deviceName";

fn user_points() -> Template {
    Template::new("user-points", GET_USER_POINTS, "user")
        .with_priority(10)
        .with_description(Language::En, "Show the current user's points balance")
        .with_description(Language::Zh, "查看当前用户的积分")
        .with_phrases(
            Language::En,
            ["check points", "show my points", "how many points do I have", "points balance"],
        )
        .with_phrases(Language::Zh, ["查询积分", "我的积分", "我有多少积分"])
        .with_phrases(Language::Ja, ["ポイントを確認", "私のポイント", "ポイント残高"])
        .with_phrases(Language::Ko, ["포인트 확인", "내 포인트", "포인트가 얼마나 있어"])
        .with_phrases(Language::Es, ["ver mis puntos", "cuántos puntos tengo", "saldo de puntos"])
        .with_phrases(Language::Fr, ["voir mes points", "combien de points ai-je", "solde de points"])
        .with_phrases(Language::De, ["meine Punkte anzeigen", "wie viele Punkte habe ich", "Punktestand"])
}

fn user_profile() -> Template {
    Template::new("user-profile", GET_USER_PROFILE, "user")
        .with_priority(10)
        .with_description(Language::En, "Show the current user's profile")
        .with_description(Language::Zh, "查看用户资料")
        .with_phrases(Language::En, ["show my profile", "view profile", "who am I", "account details"])
        .with_phrases(Language::Zh, ["查看个人资料", "我的资料", "我的账户信息"])
        .with_phrases(Language::Ja, ["プロフィールを表示", "私のプロフィール", "アカウント情報"])
        .with_phrases(Language::Ko, ["내 프로필 보기", "프로필 확인", "계정 정보"])
        .with_phrases(Language::Es, ["ver mi perfil", "mostrar perfil", "datos de mi cuenta"])
        .with_phrases(Language::Fr, ["voir mon profil", "afficher le profil", "informations du compte"])
        .with_phrases(Language::De, ["mein Profil anzeigen", "Profil zeigen", "Kontodaten"])
}

fn list_devices() -> Template {
    Template::new("list-devices", LIST_DEVICES, "device")
        .with_priority(5)
        .with_description(Language::En, "List all registered devices")
        .with_description(Language::Zh, "列出所有设备")
        .with_phrases(Language::En, ["list devices", "show all devices", "what devices do I have"])
        .with_phrases(Language::Zh, ["显示所有设备", "设备列表", "我有哪些设备"])
        .with_phrases(Language::Ja, ["デバイス一覧", "すべてのデバイスを表示"])
        .with_phrases(Language::Ko, ["기기 목록", "모든 기기 보기"])
        .with_phrases(Language::Es, ["listar dispositivos", "mostrar todos los dispositivos"])
        .with_phrases(Language::Fr, ["lister les appareils", "afficher tous les appareils"])
        .with_phrases(Language::De, ["Geräte auflisten", "alle Geräte anzeigen"])
}

fn add_device() -> Template {
    Template::new("add-device", ADD_DEVICE, "device")
        .with_priority(5)
        .with_parameter(DEVICE_NAME)
        .with_description(Language::En, "Register a new device")
        .with_description(Language::Zh, "添加新设备")
        .with_phrases(Language::En, ["add device", "add a new device", "register a device"])
        .with_phrases(Language::Zh, ["添加设备", "新增设备"])
        .with_phrases(Language::Ja, ["デバイスを追加", "新しいデバイスを登録"])
        .with_phrases(Language::Ko, ["기기 추가", "새 기기 등록"])
        .with_phrases(Language::Es, ["agregar dispositivo", "añadir un dispositivo nuevo"])
        .with_phrases(Language::Fr, ["ajouter un appareil", "ajouter un nouvel appareil"])
        .with_phrases(Language::De, ["Gerät hinzufügen", "neues Gerät hinzufügen"])
}

fn remove_device() -> Template {
    Template::new("remove-device", REMOVE_DEVICE, "device")
        .with_priority(5)
        .with_parameter(DEVICE_NAME)
        .with_description(Language::En, "Remove a registered device")
        .with_description(Language::Zh, "删除设备")
        .with_phrases(Language::En, ["remove device", "delete a device", "unregister device"])
        .with_phrases(Language::Zh, ["删除设备", "移除设备"])
        .with_phrases(Language::Ja, ["デバイスを削除"])
        .with_phrases(Language::Ko, ["기기 삭제", "기기 제거"])
        .with_phrases(Language::Es, ["eliminar dispositivo", "borrar un dispositivo"])
        .with_phrases(Language::Fr, ["supprimer un appareil", "retirer l'appareil"])
        .with_phrases(Language::De, ["Gerät entfernen", "Gerät löschen"])
}

fn device_status() -> Template {
    Template::new("device-status", GET_DEVICE_STATUS, "device")
        .with_priority(5)
        .with_parameter(DEVICE_NAME)
        .with_description(Language::En, "Show the status of one device")
        .with_description(Language::Zh, "查看设备状态")
        .with_phrases(Language::En, ["device status", "check device status", "status of device"])
        .with_phrases(Language::Zh, ["设备状态", "查看设备状态"])
        .with_phrases(Language::Ja, ["デバイスの状態", "デバイスのステータスを確認"])
        .with_phrases(Language::Ko, ["기기 상태", "기기 상태 확인"])
        .with_phrases(Language::Es, ["estado del dispositivo"])
        .with_phrases(Language::Fr, ["état de l'appareil"])
        .with_phrases(Language::De, ["Gerätestatus", "Status des Geräts"])
}

fn show_help() -> Template {
    Template::new("help", SHOW_HELP, "system")
        .with_description(Language::En, "Explain what the assistant can do")
        .with_description(Language::Zh, "显示帮助")
        .with_phrases(Language::En, ["help", "what can you do", "show commands"])
        .with_phrases(Language::Zh, ["帮助", "你能做什么"])
        .with_phrases(Language::Ja, ["ヘルプ", "何ができますか"])
        .with_phrases(Language::Ko, ["도움말", "무엇을 할 수 있어"])
        .with_phrases(Language::Es, ["ayuda", "qué puedes hacer"])
        .with_phrases(Language::Fr, ["aide", "que peux-tu faire"])
        .with_phrases(Language::De, ["Hilfe", "was kannst du"])
}

/// The default catalog: user points and profile, device management, help.
pub fn builtin_catalog() -> TemplateCatalog {
    TemplateCatalog::from_templates([
        user_points(),
        user_profile(),
        list_devices(),
        add_device(),
        remove_device(),
        device_status(),
        show_help(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_template_covers_every_language() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), 7);
        for template in catalog.templates() {
            for language in Language::ALL {
                assert!(
                    template.templates.get(&language).is_some_and(|p| !p.is_empty()),
                    "{} has no {} phrases",
                    template.id,
                    language
                );
            }
        }
    }

    #[test]
    fn test_flattened_ids_are_unique() {
        let intents = builtin_catalog().get_all_flattened();
        let ids: HashSet<u64> = intents.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), intents.len());
    }

    #[test]
    fn test_device_actions_declare_parameter() {
        let catalog = builtin_catalog();
        for action in [ADD_DEVICE, REMOVE_DEVICE, GET_DEVICE_STATUS] {
            let template = catalog.find_by_action(action).unwrap();
            assert_eq!(template.parameters, vec![DEVICE_NAME.to_string()]);
        }
        assert!(catalog
            .find_by_action(LIST_DEVICES)
            .unwrap()
            .parameters
            .is_empty());
    }
}
