//! CPU compute backend wrapping existing Tensor operations.
//!
//! This is the default fallback backend. It wraps `Tensor` methods directly,
//! producing bit-identical results to the original non-backend code path.

use super::backend::{ComputeBackend, DeviceTensor};
use super::tensor::Tensor;

/// CPU compute backend — delegates to Tensor methods.
pub struct CpuBackend;

impl CpuBackend {
    fn as_tensor(dt: &DeviceTensor) -> &Tensor {
        dt.inner
            .downcast_ref::<Tensor>()
            .expect("CpuBackend: expected Tensor in DeviceTensor")
    }

    fn as_tensor_mut(dt: &mut DeviceTensor) -> &mut Tensor {
        dt.inner
            .downcast_mut::<Tensor>()
            .expect("CpuBackend: expected Tensor in DeviceTensor")
    }

    fn wrap(t: Tensor) -> DeviceTensor {
        DeviceTensor {
            rows: t.rows,
            cols: t.cols,
            inner: Box::new(t),
        }
    }

    fn as_1d(dt: &DeviceTensor) -> &[f32] {
        let t = Self::as_tensor(dt);
        assert_eq!(t.rows, 1, "expected 1-row tensor for 1D data");
        &t.data
    }
}

impl ComputeBackend for CpuBackend {
    fn upload(&self, t: &Tensor) -> DeviceTensor {
        Self::wrap(t.clone())
    }

    fn upload_1d(&self, v: &[f32]) -> DeviceTensor {
        Self::wrap(Tensor::from_slice(v, 1, v.len()))
    }

    fn download(&self, dt: &DeviceTensor) -> Tensor {
        Self::as_tensor(dt).clone()
    }

    fn matmul(&self, a: &DeviceTensor, b: &DeviceTensor) -> DeviceTensor {
        Self::wrap(Self::as_tensor(a).matmul(Self::as_tensor(b)))
    }

    fn matmul_transpose(&self, a: &DeviceTensor, b: &DeviceTensor) -> DeviceTensor {
        Self::wrap(Self::as_tensor(a).matmul_transpose(Self::as_tensor(b)))
    }

    fn add_bias(&self, t: &mut DeviceTensor, bias: &DeviceTensor) {
        let bias_data = Self::as_1d(bias);
        Self::as_tensor_mut(t).add_bias(bias_data);
    }

    fn add_tensor(&self, a: &DeviceTensor, b: &DeviceTensor) -> DeviceTensor {
        Self::wrap(Self::as_tensor(a).add_tensor(Self::as_tensor(b)))
    }

    fn gelu(&self, t: &DeviceTensor) -> DeviceTensor {
        Self::wrap(Self::as_tensor(t).gelu())
    }

    fn layer_norm(
        &self,
        t: &DeviceTensor,
        w: &DeviceTensor,
        b: &DeviceTensor,
        eps: f32,
    ) -> DeviceTensor {
        let weight = Self::as_1d(w);
        let bias = Self::as_1d(b);
        Self::wrap(Self::as_tensor(t).layer_norm(weight, bias, eps))
    }

    fn softmax_rows(&self, t: &mut DeviceTensor) {
        Self::as_tensor_mut(t).softmax_rows();
    }

    fn scale(&self, t: &mut DeviceTensor, factor: f32) {
        Self::as_tensor_mut(t).scale(factor);
    }

    fn slice_columns(&self, t: &DeviceTensor, start: usize, end: usize) -> DeviceTensor {
        let src = Self::as_tensor(t);
        let width = end - start;
        let mut data = vec![0.0f32; src.rows * width];
        for r in 0..src.rows {
            let src_off = r * src.cols + start;
            let dst_off = r * width;
            data[dst_off..dst_off + width].copy_from_slice(&src.data[src_off..src_off + width]);
        }
        Self::wrap(Tensor::from_slice(&data, src.rows, width))
    }

    fn scatter_columns(&self, dst: &mut DeviceTensor, src: &DeviceTensor, col_offset: usize) {
        let src_t = Self::as_tensor(src);
        let dst_t = Self::as_tensor_mut(dst);
        for r in 0..src_t.rows {
            let src_off = r * src_t.cols;
            let dst_off = r * dst_t.cols + col_offset;
            dst_t.data[dst_off..dst_off + src_t.cols]
                .copy_from_slice(&src_t.data[src_off..src_off + src_t.cols]);
        }
    }

    fn zeros(&self, rows: usize, cols: usize) -> DeviceTensor {
        Self::wrap(Tensor::zeros(rows, cols))
    }

    fn apply_attention_mask(&self, scores: &mut DeviceTensor, mask: &[u32]) {
        let t = Self::as_tensor_mut(scores);
        let seq_len = t.cols;
        for i in 0..t.rows {
            for j in 0..seq_len {
                if mask[j] == 0 {
                    t.data[i * seq_len + j] = -10000.0;
                }
            }
        }
    }

    fn mean_pool(&self, hidden: &DeviceTensor, mask: &[u32]) -> Vec<f32> {
        let t = Self::as_tensor(hidden);
        let mut sum = vec![0.0f32; t.cols];
        let mut count = 0.0f32;
        for s in 0..t.rows {
            if mask[s] == 1 {
                let row = t.row(s);
                for i in 0..t.cols {
                    sum[i] += row[i];
                }
                count += 1.0;
            }
        }
        if count > 0.0 {
            for v in sum.iter_mut() {
                *v /= count;
            }
        }
        sum
    }

    fn name(&self) -> &'static str {
        "CPU"
    }
}
