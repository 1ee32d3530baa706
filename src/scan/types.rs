use serde::{Deserialize, Serialize};

/// 标签中表示"新鲜"的标记
pub const FRESH_MARKER: &str = "Healthy";

/// 单次扫描的 top-1 预测，确认前只存在于客户端
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f32,
}

impl Prediction {
    pub fn category(&self) -> Category {
        Category::from_label(&self.label)
    }
}

/// 新鲜度分类，仅由标签文本推导
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Fresh,
    NotFresh,
}

impl Category {
    pub fn from_label(label: &str) -> Self {
        if label.contains(FRESH_MARKER) {
            Category::Fresh
        } else {
            Category::NotFresh
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Fresh => "Segar (Fresh)",
            Category::NotFresh => "Tidak Segar (Not Fresh)",
        }
    }
}

/// 扫描接口返回内容
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub prediction: Prediction,
    pub category: Category,
    pub category_name: &'static str,
    /// 处理耗时（秒）
    pub processing_time: f32,
}

impl ScanOutcome {
    pub fn new(prediction: Prediction, processing_time: f32) -> Self {
        let category = prediction.category();
        Self {
            prediction,
            category,
            category_name: category.display_name(),
            processing_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_marker_means_fresh() {
        assert_eq!(Category::from_label("Apple_Healthy"), Category::Fresh);
        assert_eq!(Category::from_label("Banana_Rotten"), Category::NotFresh);
        assert_eq!(Category::from_label("Unknown"), Category::NotFresh);
        // 大小写敏感
        assert_eq!(Category::from_label("apple_healthy"), Category::NotFresh);
    }

    #[test]
    fn category_ignores_probability() {
        let low = Prediction {
            label: "Tomato_Healthy".into(),
            probability: 0.01,
        };
        let high = Prediction {
            label: "Tomato_Healthy".into(),
            probability: 0.99,
        };
        assert_eq!(low.category(), high.category());
        assert_eq!(low.category().display_name(), "Segar (Fresh)");
    }

    #[test]
    fn serializes_category_snake_case() {
        let json = serde_json::to_string(&Category::NotFresh).unwrap();
        assert_eq!(json, "\"not_fresh\"");
    }
}
