use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{GoldEntry, MergedEntry, ProverbEntry};

/// 读取必需的 JSON 文件
///
/// 文件缺失为 [`PipelineError::MissingInput`]，内容无法解析为
/// [`PipelineError::InvalidInput`]，两者都会中止调用的命令。
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> PipelineResult<T> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::MissingInput(path.display().to_string()));
        }
        Err(e) => return Err(PipelineError::from(e).with_context(path.display())),
    };

    serde_json::from_str(&data).map_err(|e| {
        PipelineError::InvalidInput(format!("{} contains invalid JSON: {}", path.display(), e))
    })
}

/// 以格式化 JSON 写入，通过一次重命名替换原文件
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temporary_sibling(path);
    {
        let file = fs::File::create(&tmp_path)
            .map_err(|e| PipelineError::from(e).with_context(tmp_path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    fs::rename(&tmp_path, path).map_err(|e| PipelineError::from(e).with_context(path.display()))
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn load_proverbs(path: &Path) -> PipelineResult<Vec<ProverbEntry>> {
    read_json_file(path)
}

pub fn save_proverbs(path: &Path, proverbs: &[ProverbEntry]) -> PipelineResult<()> {
    write_json_file(path, proverbs)
}

pub fn load_merged(path: &Path) -> PipelineResult<Vec<MergedEntry>> {
    read_json_file(path)
}

pub fn save_merged(path: &Path, merged: &[MergedEntry]) -> PipelineResult<()> {
    write_json_file(path, merged)
}

pub fn load_gold(path: &Path) -> PipelineResult<Vec<GoldEntry>> {
    read_json_file(path)
}
