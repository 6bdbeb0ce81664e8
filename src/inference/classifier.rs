use std::cmp::Ordering;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::inference::tensor::{NormalizedTensor, LABELS};

/// A trained digit classifier, shared read-only between all requests.
pub trait DigitClassifier: Send + Sync {
    /// Runs the forward pass, returning one row of class probabilities per batch entry.
    fn predict(&self, input: &NormalizedTensor) -> Result<Vec<Vec<f32>>>;
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Prediction {
    pub digit: usize,
    pub probabilities: Vec<f32>,
}

#[tracing::instrument(level = "debug", skip_all)]
pub fn classify<C>(classifier: &C, input: &NormalizedTensor) -> Result<Prediction>
where
    C: DigitClassifier + ?Sized,
{
    let Some(probabilities) = classifier.predict(input)?.into_iter().next() else {
        bail!("Model returned no predictions")
    };
    if probabilities.len() != LABELS {
        bail!(
            "Model returned {} class scores, expected {LABELS}",
            probabilities.len()
        );
    }
    let Some(digit) = argmax(&probabilities) else {
        bail!("Model returned an empty prediction")
    };

    Ok(Prediction {
        digit,
        probabilities,
    })
}

/// Index of the largest value, the first one wins on ties.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (index, &value)| match best {
            Some((_, max)) if value.total_cmp(&max) != Ordering::Greater => best,
            _ => Some((index, value)),
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::tensor::IMAGE_DIM;

    struct FixedClassifier(Vec<Vec<f32>>);

    impl DigitClassifier for FixedClassifier {
        fn predict(&self, _: &NormalizedTensor) -> Result<Vec<Vec<f32>>> {
            Ok(self.0.clone())
        }
    }

    fn blank() -> NormalizedTensor {
        NormalizedTensor::from_intensities(vec![0.0; IMAGE_DIM]).unwrap()
    }

    #[test]
    fn picks_the_most_probable_digit() {
        let row = vec![0.1, 0.05, 0.7, 0.05, 0.02, 0.02, 0.02, 0.02, 0.01, 0.01];
        let prediction = classify(&FixedClassifier(vec![row.clone()]), &blank()).unwrap();

        assert_eq!(prediction.digit, 2);
        assert_eq!(prediction.probabilities, row);
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        let row = vec![0.0, 0.1, 0.0, 0.4, 0.0, 0.0, 0.1, 0.4, 0.0, 0.0];
        let prediction = classify(&FixedClassifier(vec![row]), &blank()).unwrap();
        assert_eq!(prediction.digit, 3);
    }

    #[test]
    fn only_the_first_row_is_used() {
        let mut first = vec![0.0; LABELS];
        first[9] = 1.0;
        let mut second = vec![0.0; LABELS];
        second[1] = 1.0;

        let prediction = classify(&FixedClassifier(vec![first, second]), &blank()).unwrap();
        assert_eq!(prediction.digit, 9);
    }

    #[test]
    fn rejects_malformed_model_output() {
        assert!(classify(&FixedClassifier(vec![]), &blank()).is_err());
        assert!(classify(&FixedClassifier(vec![vec![1.0; 3]]), &blank()).is_err());
    }

    #[test]
    fn argmax_of_empty_is_none() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), Some(1));
    }
}
