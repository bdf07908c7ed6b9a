//! 在模拟站点上逐分类逐页采集

use std::time::Duration;

use akhaan::collector::Collector;
use akhaan::config::PipelineConfig;
use akhaan::storage::dataset;

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{listing_page, RecordingSleeper, StubFetcher, TestEnvironment};

fn two_category_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.scraper.categories = vec!["ੳ".to_string(), "ਅ".to_string()];
    config
}

#[test]
fn test_two_titles_then_empty_page_moves_to_next_category() {
    let fetcher = StubFetcher::default()
        .with_page(
            "ੳ",
            1,
            listing_page(&[
                "ਉੱਚੀ ਦੁਕਾਨ ਫਿੱਕਾ ਪਕਵਾਨ – High shop, bland dish",
                "ਉਜੜੇ ਬਾਗਾਂ ਦੇ ਗਾਲ੍ਹੜ ਪਟਵਾਰੀ - squirrels in charge",
            ]),
        )
        .with_page("ੳ", 2, listing_page(&[]))
        .with_page("ਅ", 1, listing_page(&[]));
    let sleeper = RecordingSleeper::default();
    let config = two_category_config();

    let (proverbs, summaries) = Collector::new(&fetcher, &config.scraper)
        .unwrap()
        .with_sleeper(&sleeper)
        .collect()
        .unwrap();

    assert_eq!(proverbs.len(), 2);
    assert_eq!(proverbs[0].id, 1);
    assert_eq!(proverbs[0].proverb_gurmukhi, "ਉੱਚੀ ਦੁਕਾਨ ਫਿੱਕਾ ਪਕਵਾਨ");
    assert_eq!(proverbs[1].id, 2);
    assert_eq!(proverbs[1].proverb_gurmukhi, "ਉਜੜੇ ਬਾਗਾਂ ਦੇ ਗਾਲ੍ਹੜ ਪਟਵਾਰੀ");
    assert!(proverbs.iter().all(|p| p.literal_translation.is_empty()));

    let requested = fetcher.requested.borrow().clone();
    assert_eq!(
        requested,
        vec![
            ("ੳ".to_string(), "1".to_string()),
            ("ੳ".to_string(), "2".to_string()),
            ("ਅ".to_string(), "1".to_string()),
        ]
    );

    // 只在唯一有内容的页面之后停顿一次
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(1)]);
    assert_eq!(summaries[0].proverbs, 2);
    assert_eq!(summaries[1].proverbs, 0);
}

#[test]
fn test_missing_page_ends_category_not_run() {
    // 分类 ੳ 直接返回 404
    let fetcher = StubFetcher::default()
        .with_page("ਅ", 1, listing_page(&["ਅੱਖਾਂ ਦਾ ਤਾਰਾ – apple of the eye"]));
    let config = two_category_config();

    let (proverbs, _) = Collector::new(&fetcher, &config.scraper)
        .unwrap()
        .with_sleeper(RecordingSleeper::default())
        .collect()
        .unwrap();

    assert_eq!(proverbs.len(), 1);
    assert_eq!(proverbs[0].id, 1);
    assert_eq!(fetcher.requested.borrow().len(), 3);
}

#[test]
fn test_list_is_saved_after_each_category() {
    let env = TestEnvironment::new();
    let output = env.path("punjabi_proverbs.json");
    let fetcher = StubFetcher::default()
        .with_page("ੳ", 1, listing_page(&["ਉੱਚੀ ਦੁਕਾਨ ਫਿੱਕਾ ਪਕਵਾਨ – meaning"]));
    let config = two_category_config();

    Collector::new(&fetcher, &config.scraper)
        .unwrap()
        .with_sleeper(RecordingSleeper::default())
        .with_output(&output)
        .collect()
        .unwrap();

    let saved = dataset::load_proverbs(&output).unwrap();
    assert_eq!(saved.len(), 1);
    assert!(env.read("punjabi_proverbs.json").contains("\"literal_translation\": \"\""));
}
