use crate::utils::error::ScanError;
use crate::Result;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// 类别索引映射：训练时导出的 `{"0": "Apple_Healthy", ...}`
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    labels: BTreeMap<usize, String>,
}

impl LabelMap {
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScanError::NotFound(format!(
                "Labels file not found: {}",
                path.display()
            )));
        }

        tracing::info!("Loading label mapping from: {}", path.display());

        let content = fs::read_to_string(path)
            .map_err(|e| ScanError::ModelLoad(format!("Failed to read labels file: {}", e)))?;

        Self::from_json(&content)
    }

    /// 解析 JSON，键统一转换为整数
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: HashMap<String, String> = serde_json::from_str(content)
            .map_err(|e| ScanError::ModelLoad(format!("Invalid labels file: {}", e)))?;

        let mut labels = BTreeMap::new();
        for (key, label) in raw {
            let index = key.trim().parse::<usize>().map_err(|_| {
                ScanError::ModelLoad(format!("Label key '{}' is not a class index", key))
            })?;
            labels.insert(index, label);
        }

        tracing::debug!("Loaded {} labels", labels.len());
        Ok(Self { labels })
    }

    /// 查找类别名，未映射时回退为索引字符串
    pub fn resolve(&self, index: usize) -> String {
        self.labels
            .get(&index)
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.labels.values().any(|l| l == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.values().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<(usize, S)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (usize, S)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(|(i, l)| (i, l.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_string_keys_to_indices() {
        let map = LabelMap::from_json(r#"{"0": "Apple_Healthy", "1": "Apple_Rotten"}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve(0), "Apple_Healthy");
        assert_eq!(map.resolve(1), "Apple_Rotten");
        assert!(map.contains_label("Apple_Rotten"));
        assert!(!map.contains_label("Banana_Rotten"));
    }

    #[test]
    fn unmapped_index_falls_back_to_number() {
        let map: LabelMap = [(0, "Apple_Healthy")].into_iter().collect();
        assert_eq!(map.resolve(7), "7");
    }

    #[test]
    fn rejects_non_integer_keys() {
        let err = LabelMap::from_json(r#"{"apple": "Apple_Healthy"}"#).unwrap_err();
        assert!(matches!(err, ScanError::ModelLoad(_)));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = LabelMap::from_path(&dir.path().join("class_indices.json")).unwrap_err();
        assert!(matches!(err, ScanError::NotFound(_)));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("class_indices.json");
        fs::write(&path, r#"{"0": "Carrot_Healthy", "1": "Carrot_Rotten"}"#).unwrap();

        let map = LabelMap::from_path(&path).unwrap();
        assert_eq!(map.labels().collect::<Vec<_>>(), vec!["Carrot_Healthy", "Carrot_Rotten"]);
    }
}
