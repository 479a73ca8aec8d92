use candle::{DType, Device, Result, Tensor};
use candle_core as candle;
use candle_core::IndexOp;
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use std::path::Path;
use std::sync::Arc;

/// `BertForSequenceClassification` checkpoints nest the encoder under `bert.`;
/// bare encoder exports have no prefix.
const ENCODER_PREFIX: &str = "bert";

struct SequenceClassifierImpl {
    encoder: BertModel,
    pooler: Option<Linear>,
    classifier: Linear,
}

impl SequenceClassifierImpl {
    fn load(vb: VarBuilder, config: &Config, num_labels: usize) -> Result<Self> {
        let prefixed =
            vb.contains_tensor(&format!("{ENCODER_PREFIX}.embeddings.word_embeddings.weight"));
        let encoder_vb = if prefixed {
            vb.pp(ENCODER_PREFIX)
        } else {
            vb.clone()
        };
        let encoder = BertModel::load(encoder_vb.clone(), config)?;

        let hidden_size = config.hidden_size;
        // MiniLM/BERT cross-encoders classify the pooled [CLS] vector.
        let pooler = if encoder_vb.contains_tensor("pooler.dense.weight") {
            Some(candle_nn::linear(
                hidden_size,
                hidden_size,
                encoder_vb.pp("pooler").pp("dense"),
            )?)
        } else {
            None
        };
        let classifier = candle_nn::linear(hidden_size, num_labels, vb.pp("classifier"))?;

        Ok(Self {
            encoder,
            pooler,
            classifier,
        })
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let hidden = self
            .encoder
            .forward(input_ids, token_type_ids, Some(attention_mask))?;
        let cls = hidden.i((.., 0, ..))?;
        let pooled = match &self.pooler {
            Some(dense) => dense.forward(&cls)?.tanh()?,
            None => cls,
        };
        self.classifier.forward(&pooled)
    }
}

/// BERT sequence classifier producing `[batch, num_labels]` logits.
#[derive(Clone)]
pub struct BertClassifier(Arc<SequenceClassifierImpl>);

impl BertClassifier {
    /// Memory-maps `model.safetensors` from `model_dir` and builds the classifier head.
    pub fn load<P: AsRef<Path>>(
        model_dir: P,
        config: &Config,
        num_labels: usize,
        device: &Device,
    ) -> Result<Self> {
        let weights_path = model_dir.as_ref().join("model.safetensors");

        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

        let model = SequenceClassifierImpl::load(vb, config, num_labels)?;

        Ok(Self(Arc::new(model)))
    }

    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        self.0.forward(input_ids, token_type_ids, attention_mask)
    }
}
