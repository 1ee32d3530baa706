use crate::utils::error::ScanError;
use crate::Result;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 标签 -> 确认时间戳列表（按追加顺序）
pub type ScanData = BTreeMap<String, Vec<String>>;

/// 与原数据文件兼容的时间戳格式（本地时间，微秒精度，无时区）
pub fn now_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// 整个 JSON 文档为读写单位的扫描记录存储
///
/// 进程内的写操作经由同一把锁串行化；多进程同时写同一文件时
/// 仍然是后写覆盖先写。
pub struct ScanStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ScanStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取全部记录；文件不存在时返回空映射
    pub fn load(&self) -> Result<ScanData> {
        if !self.path.exists() {
            return Ok(ScanData::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let data = serde_json::from_str(&content).map_err(|e| {
            ScanError::Store(format!("Invalid scan data in {}: {}", self.path.display(), e))
        })?;

        Ok(data)
    }

    /// 追加一条确认记录并立即写回
    pub fn append(&self, label: &str, timestamp: &str) -> Result<ScanData> {
        let _guard = self.write_lock.lock();

        let mut data = self.load()?;
        data.entry(label.to_string())
            .or_default()
            .push(timestamp.to_string());
        self.write(&data)?;

        tracing::info!("Recorded scan: label={}, at={}", label, timestamp);
        Ok(data)
    }

    /// 覆盖写入全部记录
    pub fn save(&self, data: &ScanData) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.write(data)
    }

    /// 清空全部记录
    pub fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.write(&ScanData::new())?;
        tracing::info!("Cleared scan data at {}", self.path.display());
        Ok(())
    }

    fn write(&self, data: &ScanData) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // 先写临时文件再重命名，避免留下半截文档
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(data)?)?;
        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!("Saved {} labels to {}", data.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store_in(dir: &tempfile::TempDir) -> ScanStore {
        ScanStore::new(dir.path().join("scan_data.json"))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().unwrap().is_empty());
    }

    #[test]
    fn append_adds_exactly_one_entry_at_the_end() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.append("Apple_Healthy", "2024-05-01T10:00:00.000000").unwrap();
        let before = store.load().unwrap()["Apple_Healthy"].len();

        store.append("Apple_Healthy", "2024-05-01T10:05:00.000000").unwrap();
        let data = store.load().unwrap();

        assert_eq!(data["Apple_Healthy"].len(), before + 1);
        assert_eq!(
            data["Apple_Healthy"].last().map(String::as_str),
            Some("2024-05-01T10:05:00.000000")
        );
    }

    #[test]
    fn clear_leaves_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.append("Apple_Rotten", &now_timestamp()).unwrap();
        store.clear().unwrap();

        assert!(store.load().unwrap().is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{}");
    }

    #[test]
    fn repeated_loads_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append("Banana_Healthy", "2024-01-01T00:00:00.000001").unwrap();

        assert_eq!(store.load().unwrap(), store.load().unwrap());
    }

    #[test]
    fn save_overwrites_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append("Apple_Healthy", "t1").unwrap();

        let mut data = ScanData::new();
        data.insert("Carrot_Rotten".to_string(), vec!["t2".to_string()]);
        store.save(&data).unwrap();

        assert_eq!(store.load().unwrap(), data);
    }

    #[test]
    fn reads_existing_python_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            "{\n  \"Apple_Healthy\": [\n    \"2024-03-02T09:15:27.123456\"\n  ]\n}",
        )
        .unwrap();

        let data = store.load().unwrap();
        assert_eq!(data["Apple_Healthy"], vec!["2024-03-02T09:15:27.123456".to_string()]);
    }

    #[test]
    fn malformed_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "[1, 2").unwrap();

        assert!(matches!(store.load(), Err(ScanError::Store(_))));
    }

    #[test]
    fn timestamp_has_microsecond_precision() {
        let ts = now_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%.6f").is_ok());
        assert_eq!(ts.split('.').nth(1).map(str::len), Some(6));
    }
}
