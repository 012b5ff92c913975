use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Description used when a label has no entry in the table
pub const DEFAULT_DESCRIPTION: &str = "Không có mô tả";

/// Vietnamese road sign codes and their meaning
const BUILTIN_DESCRIPTIONS: &[(&str, &str)] = &[
    ("101", "Đường cấm"),
    ("102", "Cấm ngược chiều"),
    ("103a", "Cấm xe ôtô"),
    ("103b", "Cấm ôtô rẻ phải"),
    ("103c", "Cấm ôtô rẻ trái"),
    ("111b_111d", "Cấm xe 3 bánh và xe 4 bánh thô sơ"),
    ("117", "Hạn chế chiều cao"),
    ("118", "Hạn chế chiều ngang"),
    ("121", "Cự ly tối thiếu"),
    ("123a", "Cấm rẻ trái"),
    ("123b", "Cấm rẻ phải"),
    ("124a", "Cấm quay đầu"),
    ("124b", "Cấm ôtô quay đầu"),
    ("124c", "Cấm rẻ trái quay đầu"),
    ("125", "Cấm vượt"),
    ("127_40", "Tốc độ tối đa 40km/h"),
    ("127_60", "Tốc độ tối đa 60km/h"),
    ("127_70", "Tốc độ tối đa 70km/h"),
    ("127_80", "Tốc độ tối đa 80km/h"),
    ("127_100", "Tốc độ tối đa là 100km/h"),
    ("128", "Cấm bóp còi"),
    ("129", "Trạm thuế"),
    ("130", "Cấm dừng và đổ"),
    ("131a", "Cấm đổ"),
    ("131b", "Cấm đổ lẻ"),
    ("133", "Hết cấm vượt"),
    ("135", "Hết lệnh cấm"),
    ("136", "Cấm đi thẳng"),
    ("137", "Cấm rẻ trái và phải"),
    ("201a", "Chổ ngoặt nguy hiểm trái"),
    ("201b", "Chổ ngoặt nguy hiểm phải"),
    ("202", "Nhiều chổ ngoặt"),
    ("203a", "Đường hẹp"),
    ("203b", "Đường hẹp trái"),
    ("204", "Đường hai chiều"),
    ("204c", "Đường hẹp phải"),
    ("205a", "Giao nhau cùng cấp"),
    ("205b", "Giao nhau đồng cấp"),
    ("205d", "Giao nhau đồng cấp"),
    ("205e", "Giao nhau đồng cấp"),
    ("207a", "Giao nhau không ưu tiên"),
    ("207b", "Giao nhau không ưu tiên"),
    ("207c", "Giao nhau không ưu tiên"),
    ("208", "Giao nhau ưu tiên"),
    ("217", "Đường hầm"),
    ("218", "Cửa chui"),
    ("219", "Dốc xuống"),
    ("220", "Dốc lên"),
    ("221", "Đường không bằng phẳng"),
    ("227", "Công trường"),
    ("236", "Hết đường đôi"),
    ("238", "Tốc độ tối đa là 90km/h"),
    ("239a", "Cáp điện phía trên"),
    ("239b", "Chiều cao an toàn"),
    ("241", "Đoạn đường hay xảy ra tai nạn"),
    ("244", "Đi chậm"),
    ("301", "Đi thẳng"),
    ("301d", "Chỉ được rẻ phải"),
    ("301e", "Chỉ được rẻ trái"),
    ("302", "Đi sang phải"),
    ("303", "Vòng xuyến"),
    ("306_30", "Tốc độ tối thiếu là 30km/h"),
    ("306_60", "Tốc độ tối thiếu là 60km/h"),
    ("307_30", "Hết hạn chế tốc độ tối thiểu"),
    ("401", "Bắt đầu đường ưu tiên"),
    ("402", "Hết ưu tiên"),
    ("403a", "Đường dành cho ôtô"),
    ("403b", "Đường giành cho ôtô và môtô"),
    ("405c", "Đường cụt"),
    ("407a", "Đường một chiều"),
    ("408", "Nơi đậu xe"),
    ("409", "Được phép quay đầu"),
    ("423", "Đường đi bộ"),
    ("425", "Bệnh viện"),
    ("434", "Bến xe buýt"),
    ("437", "Đường cao tốc"),
];

/// Accepted layouts of a descriptions file: a bare `"code": "text"` object,
/// or that object under `descriptions` next to an optional `fallback`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DescriptionsFile {
    Full {
        descriptions: HashMap<String, String>,
        #[serde(default)]
        fallback: Option<String>,
    },
    Flat(HashMap<String, String>),
}

/// Read-only mapping from sign code to a human-readable description
#[derive(Debug, Clone)]
pub struct LabelTable {
    descriptions: HashMap<String, String>,
    fallback: String,
}

impl LabelTable {
    /// Table of the Vietnamese sign codes the bundled model was trained on
    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN_DESCRIPTIONS.iter().copied())
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            descriptions: pairs
                .into_iter()
                .map(|(code, text)| (code.to_string(), text.to_string()))
                .collect(),
            fallback: DEFAULT_DESCRIPTION.to_string(),
        }
    }

    /// Load a table from a JSON descriptions file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read label descriptions: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid label descriptions file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let (descriptions, fallback) = match serde_json::from_str(content)? {
            DescriptionsFile::Full { descriptions, fallback } => (descriptions, fallback),
            DescriptionsFile::Flat(descriptions) => (descriptions, None),
        };
        Ok(Self {
            descriptions,
            fallback: fallback.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        })
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn describe(&self, label: &str) -> &str {
        self.descriptions
            .get(label)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Class index to label table of a detection model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Load names from a text file, one label per line in class index order
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read class names: {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        Self {
            names: content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ClassNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
