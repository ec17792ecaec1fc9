// tests/keywords.rs
use listing_watch::keywords::{matches, KeywordSet, ENV_KEYWORDS_PATH};
use std::{env, fs};

#[test]
fn examples_from_the_readme() {
    assert!(matches("Coin Laundromat For Sale", &["coin"]));
    assert!(!matches("Bakery for sale", &["coin"]));
    assert!(matches("SELF-SERVICE CAR WASH", &["car wash"]));
}

#[test]
fn load_from_json_and_toml() {
    let dir = tempfile::tempdir().unwrap();

    let p_json = dir.path().join("keywords.json");
    fs::write(&p_json, r#"[" Laundromat ", "", "COIN", "coin"]"#).unwrap();
    let kj = KeywordSet::load_from(&p_json).unwrap();
    assert_eq!(kj.as_slice(), ["laundromat", "coin"]);

    let p_toml = dir.path().join("keywords.toml");
    fs::write(&p_toml, r#"keywords = ["Dry Clean", "car wash"]"#).unwrap();
    let kt = KeywordSet::load_from(&p_toml).unwrap();
    assert_eq!(kt.as_slice(), ["dry clean", "car wash"]);

    let bad = dir.path().join("bad.json");
    fs::write(&bad, r#"{"keywords": "nope"}"#).unwrap();
    assert!(KeywordSet::load_from(&bad).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_KEYWORDS_PATH);

    // 1) nothing → empty
    assert!(KeywordSet::load_default().unwrap().is_empty());

    // 2) config/keywords.toml fallback
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/keywords.toml"), r#"keywords = ["deli"]"#).unwrap();
    assert_eq!(KeywordSet::load_default().unwrap().as_slice(), ["deli"]);

    // 3) ./keywords.json wins over config/
    fs::write(tmp.path().join("keywords.json"), r#"["bakery"]"#).unwrap();
    assert_eq!(KeywordSet::load_default().unwrap().as_slice(), ["bakery"]);

    // 4) env wins over everything
    let p_env = tmp.path().join("custom.json");
    fs::write(&p_env, r#"["florist"]"#).unwrap();
    env::set_var(ENV_KEYWORDS_PATH, p_env.display().to_string());
    assert_eq!(KeywordSet::load_default().unwrap().as_slice(), ["florist"]);

    // 5) env pointing nowhere is an error, and load_or_empty degrades
    env::set_var(ENV_KEYWORDS_PATH, tmp.path().join("missing.json").display().to_string());
    assert!(KeywordSet::load_default().is_err());
    assert!(KeywordSet::load_or_empty().is_empty());
    env::remove_var(ENV_KEYWORDS_PATH);

    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn malformed_file_degrades_to_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("keywords.json");
    fs::write(&p, "[\"unterminated").unwrap();
    env::set_var(ENV_KEYWORDS_PATH, p.display().to_string());
    assert!(KeywordSet::load_or_empty().is_empty());
    env::remove_var(ENV_KEYWORDS_PATH);
}
