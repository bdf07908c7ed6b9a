// 集成测试共用工具
//
// 远程模型、页面获取和休眠的替身，以及存放单个测试数据文件的临时目录。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use url::Url;

use akhaan::analysis::{ChatClient, ChatRequest, Sleeper};
use akhaan::network::Fetcher;
use akhaan::{PipelineError, PipelineResult, ProverbEntry};

/// 由闭包应答并统计调用次数的对话客户端
pub struct StubChatClient {
    calls: Cell<usize>,
    reply: Box<dyn Fn(usize, &ChatRequest) -> PipelineResult<String>>,
}

impl StubChatClient {
    pub fn new(reply: impl Fn(usize, &ChatRequest) -> PipelineResult<String> + 'static) -> Self {
        Self {
            calls: Cell::new(0),
            reply: Box::new(reply),
        }
    }

    /// 总是返回 `text`
    pub fn answering(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_, _| Ok(text.clone()))
    }

    /// 总是限流
    pub fn rate_limited() -> Self {
        Self::new(|_, _| Err(PipelineError::RateLimited("429 Too Many Requests".to_string())))
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ChatClient for StubChatClient {
    fn complete(&self, request: &ChatRequest) -> PipelineResult<String> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        (self.reply)(call, request)
    }
}

/// 只记录请求的等待时间，不真正休眠
#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.delays.borrow_mut().push(duration);
    }
}

/// 按（分类，页码）返回预设页面，其余一律 404
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<(String, String), String>,
    pub requested: RefCell<Vec<(String, String)>>,
}

impl StubFetcher {
    pub fn with_page(mut self, category: &str, page: usize, html: impl Into<String>) -> Self {
        self.pages
            .insert((category.to_string(), page.to_string()), html.into());
        self
    }
}

impl Fetcher for StubFetcher {
    fn fetch(&self, url: &Url) -> PipelineResult<Option<String>> {
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let key = (
            query.get("category").cloned().unwrap_or_default(),
            query.get("page").cloned().unwrap_or_default(),
        );
        self.requested.borrow_mut().push(key.clone());
        Ok(self.pages.get(&key).cloned())
    }
}

/// 每个标题一个 `card-title` 的列表页
pub fn listing_page(titles: &[&str]) -> String {
    let cards: String = titles
        .iter()
        .map(|title| format!("<div class=\"card\"><h2 class=\"card-title\">{title}</h2></div>\n"))
        .collect();
    format!("<html><body><main>{cards}</main></body></html>")
}

pub fn sample_proverbs() -> Vec<ProverbEntry> {
    vec![
        ProverbEntry::new(1, "ਉੱਚੀ ਦੁਕਾਨ ਫਿੱਕਾ ਪਕਵਾਨ").with_literal_translation("High shop, bland dish"),
        ProverbEntry::new(2, "ਘਰ ਦਾ ਭੇਤੀ ਲੰਕਾ ਢਾਹੇ")
            .with_literal_translation("The house insider destroys Lanka"),
        ProverbEntry::new(3, "ਜਿਹੜੇ ਗਰਜਦੇ ਨੇ ਉਹ ਵਰ੍ਹਦੇ ਨਹੀਂ")
            .with_literal_translation("Those who thunder do not rain"),
    ]
}

/// 单个测试的临时文件目录
pub struct TestEnvironment {
    pub dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).expect("write test file");
        path
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).expect("read test file")
    }
}
