use serde::{Deserialize, Serialize};

use super::PipelineError;

/// Maps product names to dense integer codes. The vocabulary is the sorted
/// set of names seen at training time and a name's code is its position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classes: Vec<String> = names.into_iter().map(str::to_owned).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn encode(&self, name: &str) -> Result<usize, PipelineError> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(name))
            .map_err(|_| PipelineError::UnknownProduct(name.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub(crate) fn check_shape(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("encoder vocabulary is empty".to_string());
        }
        if let Some(pair) = self.classes.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(format!(
                "encoder vocabulary must be sorted and unique (`{}` before `{}`)",
                pair[0], pair[1]
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::LabelEncoder;
    use crate::ml::PipelineError;

    #[test]
    fn codes_follow_sorted_vocabulary() {
        let encoder = LabelEncoder::fit(["Tea Kettle", "Ceramic Mug", "Stand Mixer"]);

        assert_eq!(encoder.encode("Ceramic Mug"), Ok(0));
        assert_eq!(encoder.encode("Stand Mixer"), Ok(1));
        assert_eq!(encoder.encode("Tea Kettle"), Ok(2));
    }

    #[test]
    fn unseen_name_is_unknown_product() {
        let encoder = LabelEncoder::fit(["Mug"]);
        assert_eq!(encoder.encode("mug"), Err(PipelineError::UnknownProduct("mug".to_owned())));
    }

    #[test]
    fn duplicates_collapse() {
        let encoder = LabelEncoder::fit(["b", "a", "b"]);
        assert_eq!(encoder.len(), 2);
        assert!(encoder.check_shape().is_ok());
    }

    #[test]
    fn unsorted_vocabulary_fails_shape_check() {
        let encoder: LabelEncoder =
            serde_json::from_str(r#"{"classes":["b","a"]}"#).expect("deserializes");
        assert!(encoder.check_shape().is_err());

        let empty: LabelEncoder = serde_json::from_str(r#"{"classes":[]}"#).expect("deserializes");
        assert!(empty.check_shape().is_err());
    }
}
