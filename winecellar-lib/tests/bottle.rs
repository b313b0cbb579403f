//! Bottle resolution against fake prefixes on disk

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use winecellar_lib::{AudioDriver, Bit, Bottle, Error, LoadOrder, Windows};

const USER_REG_HEADER: &str = "WINE REGISTRY Version 2\n;; All keys relative to \\\\User\\\\S-1-5-21-0-0-0-1000\n\n";
const SYSTEM_REG_HEADER: &str = "WINE REGISTRY Version 2\n;; All keys relative to \\\\Machine\n\n";

/// A prefix with `dosdevices/c:` and the given registry bodies
fn fake_prefix(name: &str, arch: &str, user_body: &str, system_body: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join(name);
    fs::create_dir_all(prefix.join("dosdevices/c:")).unwrap();
    fs::write(
        prefix.join("user.reg"),
        format!("{}#arch={}\n\n{}", USER_REG_HEADER, arch, user_body),
    )
    .unwrap();
    fs::write(
        prefix.join("system.reg"),
        format!("{}#arch={}\n\n{}", SYSTEM_REG_HEADER, arch, system_body),
    )
    .unwrap();
    (dir, prefix)
}

fn nt_system(version: &str, build: &str, product_type: Option<&str>) -> String {
    let mut body = format!(
        "[Software\\\\Microsoft\\\\Windows NT\\\\CurrentVersion] 1700000000\n\
         #time=1da0000000000000\n\
         \"CurrentBuildNumber\"=\"{}\"\n\
         \"CurrentVersion\"=\"{}\"\n\
         \"ProductName\"=\"Microsoft Windows\"\n\n",
        build, version
    );
    if let Some(product_type) = product_type {
        body.push_str(&format!(
            "[System\\\\CurrentControlSet\\\\Control\\\\ProductOptions] 1700000000\n\
             #time=1da0000000000000\n\
             \"ProductType\"=\"{}\"\n\n",
            product_type
        ));
    }
    body
}

fn nine_x_system(version_number: &str) -> String {
    format!(
        "[Software\\\\Microsoft\\\\Windows\\\\CurrentVersion] 1700000000\n\
         #time=1da0000000000000\n\
         \"ProgramFilesDir\"=\"C:\\\\Program Files\"\n\
         \"VersionNumber\"=\"{}\"\n\n",
        version_number
    )
}

const USER_BODY: &str = r#"[Software\\Wine] 1700000000
#time=1da0000000000000
"Version"="win7"

[Software\\Wine\\DllOverrides] 1700000000
#time=1da0000000000000
"*d3d9"="native"
"dxgi"="builtin,native"
"mscoree"=""
"winegstreamer"="bogus"

[Software\\Wine\\Drivers] 1700000000
#time=1da0000000000000
"Audio"="alsa"

[Software\\Wine\\Explorer] 1700000000
#time=1da0000000000000
"Desktop"="Default"

[Software\\Wine\\Explorer\\Desktops] 1700000000
#time=1da0000000000000
"Default"="1280x720"

[Software\\Wine\\MenuFiles] 1700000000
#time=1da0000000000000
"/home/user/.config/menus/applications-merged/wine-Programs-7-Zip-7-Zip File Manager.menu"="C:\\ProgramData\\Microsoft\\Windows\\Start Menu\\Programs\\7-Zip\\7-Zip File Manager.lnk"
"/home/user/.local/share/applications/wine/Programs/7-Zip/7-Zip File Manager.desktop"="C:\\ProgramData\\Microsoft\\Windows\\Start Menu\\Programs\\7-Zip\\7-Zip File Manager.lnk"
"/home/user/.local/share/applications/wine/Programs/7-Zip/7-Zip Help.desktop"="C:\\ProgramData\\Microsoft\\Windows\\Start Menu\\Programs\\7-Zip\\7-Zip Help.lnk"
"#;

const SYSTEM_APPS: &str = r#"[Software\\Microsoft\\Windows\\CurrentVersion\\Fonts] 1700000000
#time=1da0000000000000
"Arial (TrueType)"="arial.ttf"

[Software\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\7-Zip] 1700000000
#time=1da0000000000000
"DisplayName"="7-Zip 23.01 (x64)"
"Publisher"="Igor Pavlov"

[Software\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\{23170F69-40C1-2702-2301-000001000000}] 1700000000
#time=1da0000000000000
"DisplayName"="7-Zip 23.01 MSI"

[Software\\Wow6432Node\\Microsoft\\Windows\\CurrentVersion\\Fonts] 1700000000
#time=1da0000000000000
"Arial (TrueType)"="arial32.ttf"

"#;

#[test]
fn version_from_user_registry() {
    let (_dir, prefix) = fake_prefix("office", "win64", USER_BODY, &nt_system("10.0", "18362", None));
    let bottle = Bottle::new(&prefix);
    assert_eq!(bottle.windows_version().unwrap(), Windows::Windows7);
}

#[test]
fn version_from_nt_keys() {
    let (_dir, prefix) = fake_prefix("nt", "win64", "", &nt_system("6.1", "7601", None));
    assert_eq!(Bottle::new(&prefix).windows_version().unwrap(), Windows::Windows7);

    let (_dir, prefix) = prefix_server();
    assert_eq!(
        Bottle::new(&prefix).windows_version().unwrap(),
        Windows::Windows2008R2
    );
}

fn prefix_server() -> (TempDir, PathBuf) {
    fake_prefix("server", "win64", "", &nt_system("6.1", "7601", Some("ServerNT")))
}

#[test]
fn version_with_unknown_build_falls_back_to_version_number() {
    let (_dir, prefix) = fake_prefix("nt", "win64", "", &nt_system("6.2", "1234", None));
    assert_eq!(Bottle::new(&prefix).windows_version().unwrap(), Windows::Windows8);
}

#[test]
fn version_from_9x_key() {
    let (_dir, prefix) = fake_prefix("old", "win32", "", &nine_x_system("4.10.2222"));
    assert_eq!(Bottle::new(&prefix).windows_version().unwrap(), Windows::Windows98);

    let (_dir, prefix) = fake_prefix("odd", "win32", "", &nine_x_system("4.99.1"));
    assert_eq!(Bottle::new(&prefix).windows_version().unwrap(), Windows::Windows7);
}

#[test]
fn unknown_version_names_the_bottle() {
    let (_dir, prefix) = fake_prefix(".hidden", "win64", "", "");
    let err = Bottle::new(&prefix).windows_version().unwrap_err();
    assert!(matches!(err, Error::UnknownWindowsVersion { .. }));
    let message = err.to_string();
    assert!(message.contains("Wine machine: hidden"), "{}", message);
    assert!(message.contains(&prefix.display().to_string()), "{}", message);
}

#[test]
fn unreadable_registry_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Bottle::new(dir.path()).windows_version().unwrap_err();
    assert!(matches!(err, Error::RegistryUnreadable { .. }));
}

#[test]
fn status_requires_dosdevices() {
    let (_dir, prefix) = fake_prefix("ok", "win64", USER_BODY, "");
    assert!(Bottle::new(&prefix).status());

    fs::remove_dir_all(prefix.join("dosdevices")).unwrap();
    assert!(!Bottle::new(&prefix).status());
}

#[test]
fn bitness_from_meta_line() {
    let (_dir, prefix64) = fake_prefix("a", "win64", "", "");
    assert_eq!(Bottle::new(&prefix64).bitness().unwrap(), Bit::Win64);

    let (_dir, prefix32) = fake_prefix("b", "win32", "", "");
    assert_eq!(Bottle::new(&prefix32).bitness().unwrap(), Bit::Win32);

    let (_dir, prefix_arm) = fake_prefix("c", "arm64", "", "");
    assert!(matches!(
        Bottle::new(&prefix_arm).bitness(),
        Err(Error::UnknownBitness { .. })
    ));
}

#[test]
fn missing_arch_line() {
    let (_dir, prefix) = fake_prefix("noarch", "win64", "", "");
    fs::write(prefix.join("user.reg"), USER_REG_HEADER).unwrap();
    assert!(matches!(
        Bottle::new(&prefix).bitness(),
        Err(Error::MissingBitness { .. })
    ));
}

#[test]
fn audio_and_virtual_desktop() {
    let (_dir, prefix) = fake_prefix("media", "win64", USER_BODY, "");
    let bottle = Bottle::new(&prefix);
    assert_eq!(bottle.audio_driver().unwrap(), AudioDriver::Alsa);
    assert_eq!(bottle.virtual_desktop().unwrap().as_deref(), Some("1280x720"));

    let (_dir, plain) = fake_prefix("plain", "win64", "", "");
    let bottle = Bottle::new(&plain);
    assert_eq!(bottle.audio_driver().unwrap(), AudioDriver::PulseAudio);
    assert_eq!(bottle.virtual_desktop().unwrap(), None);
}

#[test]
fn configuration_snapshot() {
    let (_dir, prefix) = fake_prefix("Games", "win64", USER_BODY, "");
    let config = Bottle::new(&prefix).configuration().unwrap();
    assert_eq!(config.windows_version, Windows::Windows7);
    assert_eq!(config.bitness, Bit::Win64);
    assert_eq!(config.audio_driver, AudioDriver::Alsa);
    assert_eq!(config.virtual_desktop_resolution.as_deref(), Some("1280x720"));
    assert_eq!(config.folder_name, "Games");
}

#[test]
fn dll_overrides() {
    let (_dir, prefix) = fake_prefix("dlls", "win64", USER_BODY, "");
    let bottle = Bottle::new(&prefix);

    assert!(bottle.dll_override("*d3d9", LoadOrder::Native).unwrap());
    assert!(!bottle.dll_override("*d3d9", LoadOrder::Builtin).unwrap());
    assert!(bottle.dll_override("mscoree", LoadOrder::Disabled).unwrap());
    assert!(!bottle.dll_override("d3d11", LoadOrder::Native).unwrap());

    let overrides: Vec<(String, LoadOrder)> = bottle
        .dll_overrides()
        .unwrap()
        .into_iter()
        .map(|o| (o.dll_name, o.load_order))
        .collect();
    assert_eq!(
        overrides,
        vec![
            ("*d3d9".to_string(), LoadOrder::Native),
            ("dxgi".to_string(), LoadOrder::BuiltinNative),
            ("mscoree".to_string(), LoadOrder::Disabled),
        ]
    );
}

#[test]
fn menu_items_skip_merged_menus() {
    let (_dir, prefix) = fake_prefix("menu", "win64", USER_BODY, "");
    let items = Bottle::new(&prefix).menu_items().unwrap();
    assert_eq!(
        items,
        vec![
            r"C:\ProgramData\Microsoft\Windows\Start Menu\Programs\7-Zip\7-Zip File Manager.lnk",
            r"C:\ProgramData\Microsoft\Windows\Start Menu\Programs\7-Zip\7-Zip Help.lnk",
        ]
    );
}

#[test]
fn uninstaller_and_fonts() {
    let (_dir, prefix) = fake_prefix("apps", "win64", "", SYSTEM_APPS);
    let bottle = Bottle::new(&prefix);

    assert_eq!(
        bottle.uninstaller("7-Zip").unwrap().as_deref(),
        Some("7-Zip 23.01 (x64)")
    );
    assert_eq!(
        bottle
            .uninstaller("{23170F69-40C1-2702-2301-000001000000}")
            .unwrap()
            .as_deref(),
        Some("7-Zip 23.01 MSI")
    );
    assert_eq!(bottle.uninstaller("{00000000-0000}").unwrap(), None);

    assert_eq!(
        bottle.font_filename(Bit::Win32, "Arial (TrueType)").unwrap().as_deref(),
        Some("arial.ttf")
    );
    assert_eq!(
        bottle.font_filename(Bit::Win64, "Arial (TrueType)").unwrap().as_deref(),
        Some("arial32.ttf")
    );
    assert_eq!(bottle.font_filename(Bit::Win32, "Comic Sans").unwrap(), None);
}

#[test]
fn last_updated_and_c_drive() {
    let (_dir, prefix) = fake_prefix("dates", "win64", "", "");
    let bottle = Bottle::new(&prefix);

    assert!(matches!(bottle.last_updated(), Err(Error::LastUpdated { .. })));
    fs::write(prefix.join(".update-timestamp"), "not a number").unwrap();
    assert!(matches!(bottle.last_updated(), Err(Error::LastUpdated { .. })));
    fs::write(prefix.join(".update-timestamp"), "1700000000\n").unwrap();
    assert!(!bottle.last_updated().unwrap().is_empty());

    assert_eq!(bottle.c_drive().unwrap(), prefix.join("dosdevices/c:"));
    assert!(matches!(
        Bottle::new(Path::new("/nonexistent/bottle")).c_drive(),
        Err(Error::CDrive { .. })
    ));
}
