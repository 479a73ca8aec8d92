use std::path::Path;

use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::backend::BackendError;

/// Loads `tokenizer.json` from a model directory.
///
/// Pairs are truncated longest-first to `max_len` and padded to the longest
/// sequence in each batch so a batch stacks into one tensor.
pub fn load_pair_tokenizer(model_dir: &Path, max_len: usize) -> Result<Tokenizer, BackendError> {
    let tokenizer_path = model_dir.join("tokenizer.json");
    if !tokenizer_path.is_file() {
        return Err(BackendError::TokenizerLoadFailed {
            reason: format!("missing tokenizer.json in {}", model_dir.display()),
        });
    }

    let mut tokenizer =
        Tokenizer::from_file(&tokenizer_path).map_err(|e| BackendError::TokenizerLoadFailed {
            reason: e.to_string(),
        })?;

    let truncation = TruncationParams {
        max_length: max_len,
        ..Default::default()
    };
    tokenizer
        .with_truncation(Some(truncation))
        .map_err(|e| BackendError::TokenizerLoadFailed {
            reason: format!("failed to configure truncation: {e}"),
        })?;

    let mut padding = PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        ..Default::default()
    };
    if let Some(pad_id) = tokenizer.token_to_id(&padding.pad_token) {
        padding.pad_id = pad_id;
    }
    tokenizer.with_padding(Some(padding));

    Ok(tokenizer)
}
