use burn::{
    prelude::*,
    tensor::{Data, Shape},
};
use ndarray::{ArrayBase, Data as ArrayData, Dim, Dimension};

/// A trait for converting items to tensors
///
/// Implemented for dense `ndarray` arrays so the tabular model of an [`Mdp`](crate::mdp::Mdp)
/// can be handed to a `burn` backend, e.g. `lake.transitions().to_tensor(&device)`
///
/// The tensor rank must match the array rank:
/// ```compile_fail
/// use burn::{backend::NdArray, tensor::Tensor};
/// use mdps::traits::ToTensor;
///
/// let array = ndarray::Array3::<f64>::zeros((1, 2, 3));
/// let tensor: Tensor<NdArray, 2> = array.to_tensor(&Default::default());
/// ```
pub trait ToTensor<B: Backend, const D: usize> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D>;
}

// The array rank is part of its type, so a rank mismatch does not compile
impl<B, S, const D: usize> ToTensor<B, D> for &ArrayBase<S, Dim<[usize; D]>>
where
    B: Backend,
    S: ArrayData<Elem = f64>,
    Dim<[usize; D]>: Dimension,
{
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D> {
        let mut dims = [0; D];
        dims.copy_from_slice(self.shape());
        // Logical (row-major) order, whatever the memory layout
        let values = self.iter().copied().collect::<Vec<_>>();
        let data = Data::new(values, Shape::new(dims));
        Tensor::from_data(data.convert::<B::FloatElem>(), device)
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use ndarray::{Array2, Array3, Axis};

    use super::*;
    use crate::{
        gym::{FLAction, FrozenLake, FrozenLakeConfig},
        mdp::Mdp,
    };

    type TestBackend = NdArray;

    #[test]
    fn array_to_tensor_functional() {
        let device = Default::default();
        let array = Array3::from_shape_fn((2, 3, 4), |(a, b, c)| (a * 12 + b * 4 + c) as f64);
        let tensor: Tensor<TestBackend, 3> = array.to_tensor(&device);

        assert_eq!(tensor.dims(), [2, 3, 4], "shape preserved");
        let values = tensor.into_data().value;
        assert_eq!(values.len(), 24);
        assert_eq!(values[13], 13.0, "row-major order preserved");
    }

    #[test]
    fn transposed_array_to_tensor() {
        let device = Default::default();
        let array = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let tensor: Tensor<TestBackend, 2> = (&array.t()).to_tensor(&device);
        assert_eq!(
            tensor.into_data().value,
            vec![1.0, 3.0, 2.0, 4.0],
            "logical order used for non-standard layouts"
        );
    }

    #[test]
    fn action_slice_to_tensor() {
        let device = Default::default();
        let lake = FrozenLake::new(FrozenLakeConfig {
            seed: Some(0),
            ..Default::default()
        })
        .unwrap();

        let up = lake
            .transitions()
            .index_axis(Axis(0), FLAction::Up as usize);
        let tensor: Tensor<TestBackend, 2> = (&up).to_tensor(&device);
        assert_eq!(tensor.dims(), [16, 16], "rank follows the array type");
    }

    #[test]
    fn frozen_lake_model_to_tensor() {
        let device = Default::default();
        let lake = FrozenLake::new(FrozenLakeConfig {
            seed: Some(42),
            ..Default::default()
        })
        .unwrap();

        let p: Tensor<TestBackend, 3> = lake.transitions().to_tensor(&device);
        let r: Tensor<TestBackend, 3> = lake.rewards().to_tensor(&device);
        assert_eq!(p.dims(), [4, 16, 16]);
        assert_eq!(r.dims(), [4, 16, 16]);

        let row_sums = p.sum_dim(2).into_data().value;
        assert!(
            row_sums.iter().all(|x| (x - 1.0).abs() < 1e-5),
            "rows still sum to 1"
        );
    }
}
