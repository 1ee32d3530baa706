use crate::scan::Category;
use crate::store::ScanData;
use serde::Serialize;
use std::collections::BTreeMap;

/// 按新鲜度分组的计数，标签按字母序
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tallies {
    pub fresh: BTreeMap<String, usize>,
    pub not_fresh: BTreeMap<String, usize>,
    pub total_fresh: usize,
    pub total_not_fresh: usize,
}

impl Tallies {
    pub fn from_data(data: &ScanData) -> Self {
        let mut tallies = Tallies::default();

        for (label, timestamps) in data {
            let count = timestamps.len();
            if count == 0 {
                continue;
            }
            match Category::from_label(label) {
                Category::Fresh => {
                    tallies.fresh.insert(label.clone(), count);
                    tallies.total_fresh += count;
                }
                Category::NotFresh => {
                    tallies.not_fresh.insert(label.clone(), count);
                    tallies.total_not_fresh += count;
                }
            }
        }

        tallies
    }

    pub fn is_empty(&self) -> bool {
        self.fresh.is_empty() && self.not_fresh.is_empty()
    }
}
