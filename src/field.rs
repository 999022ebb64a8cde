use ndarray::{s, Array, Array3, ArrayView2, Dimension, Ix1, Ix2, Ix3, Ix4, IxDyn, ShapeError};
use thiserror::Error;

/// Value stored in invalid entries unless a field says otherwise.
pub const DEFAULT_FILL_VALUE: f64 = 1e20;

/// A numeric array paired with a validity bitmap of the same shape.
///
/// Invalid entries always hold `fill_value`.
#[derive(Clone, Debug)]
pub struct MaskedField<D: Dimension> {
    values: Array<f64, D>,
    valid: Array<bool, D>,
    fill_value: f64,
}

impl<D: Dimension> MaskedField<D> {
    pub fn new(values: Array<f64, D>, valid: Array<bool, D>) -> Result<Self, FieldError> {
        if values.shape() != valid.shape() {
            return Err(FieldError::ShapeMismatch(
                values.shape().to_vec(),
                valid.shape().to_vec(),
            ));
        }
        let mut field = Self {
            values,
            valid,
            fill_value: DEFAULT_FILL_VALUE,
        };
        field.apply_fill();
        Ok(field)
    }

    /// Marks every non-finite value as invalid.
    pub fn from_values(values: Array<f64, D>) -> Self {
        let valid = values.mapv(f64::is_finite);
        let mut field = Self {
            values,
            valid,
            fill_value: DEFAULT_FILL_VALUE,
        };
        field.apply_fill();
        field
    }

    /// A field with every entry invalid.
    pub fn masked<Sh: ndarray::ShapeBuilder<Dim = D> + Clone>(shape: Sh) -> Self {
        Self {
            values: Array::from_elem(shape.clone(), DEFAULT_FILL_VALUE),
            valid: Array::from_elem(shape, false),
            fill_value: DEFAULT_FILL_VALUE,
        }
    }

    pub fn with_fill_value(mut self, fill_value: f64) -> Self {
        self.fill_value = fill_value;
        self.apply_fill();
        self
    }

    fn apply_fill(&mut self) {
        let fill_value = self.fill_value;
        ndarray::Zip::from(&mut self.values)
            .and(&self.valid)
            .for_each(|value, &valid| {
                if !valid {
                    *value = fill_value;
                }
            });
    }

    pub fn values(&self) -> &Array<f64, D> {
        &self.values
    }

    pub fn valid(&self) -> &Array<bool, D> {
        &self.valid
    }

    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn ndim(&self) -> usize {
        self.values.ndim()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value at `index`, or `None` when it is invalid or out of bounds.
    pub fn get<I: ndarray::NdIndex<D> + Copy>(&self, index: I) -> Option<f64> {
        match self.valid.get(index) {
            Some(true) => self.values.get(index).copied(),
            _ => None,
        }
    }

    pub(crate) fn set<I: ndarray::NdIndex<D> + Copy>(&mut self, index: I, value: Option<f64>) {
        match value {
            Some(v) if v.is_finite() => {
                self.values[index] = v;
                self.valid[index] = true;
            }
            _ => {
                self.values[index] = self.fill_value;
                self.valid[index] = false;
            }
        }
    }

    pub fn count_invalid(&self) -> usize {
        self.valid.iter().filter(|&&v| !v).count()
    }

    pub fn is_fully_valid(&self) -> bool {
        self.valid.iter().all(|&v| v)
    }

    pub fn into_parts(self) -> (Array<f64, D>, Array<bool, D>, f64) {
        (self.values, self.valid, self.fill_value)
    }
}

/// Half-open row/column window into a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl Window {
    pub fn full(shape: (usize, usize)) -> Self {
        Self {
            row_start: 0,
            row_end: shape.0,
            col_start: 0,
            col_end: shape.1,
        }
    }

    pub fn nrows(&self) -> usize {
        self.row_end.saturating_sub(self.row_start)
    }

    pub fn ncols(&self) -> usize {
        self.col_end.saturating_sub(self.col_start)
    }

    pub fn is_empty(&self) -> bool {
        self.nrows() == 0 || self.ncols() == 0
    }

    pub fn fits(&self, shape: (usize, usize)) -> bool {
        self.row_start <= self.row_end
            && self.row_end <= shape.0
            && self.col_start <= self.col_end
            && self.col_end <= shape.1
    }

    pub fn slice<'a>(&self, array: ArrayView2<'a, f64>) -> ArrayView2<'a, f64> {
        array.slice_move(s![self.row_start..self.row_end, self.col_start..self.col_end])
    }
}

impl MaskedField<IxDyn> {
    /// Number of depth levels; 1 for fields without a depth axis.
    pub fn depth_count(&self) -> Result<usize, FieldError> {
        match self.ndim() {
            3 => Ok(1),
            4 => Ok(self.shape()[1]),
            n => Err(FieldError::WrongRank(n)),
        }
    }

    pub fn time_count(&self) -> usize {
        self.shape().first().copied().unwrap_or(0)
    }

    /// Horizontal (y, x) shape.
    pub fn spatial_shape(&self) -> Result<(usize, usize), FieldError> {
        match self.ndim() {
            3 | 4 => {
                let shape = self.shape();
                Ok((shape[shape.len() - 2], shape[shape.len() - 1]))
            }
            n => Err(FieldError::WrongRank(n)),
        }
    }

    fn check_time_and_window(&self, time: usize, window: &Window) -> Result<(), FieldError> {
        if time >= self.time_count() {
            return Err(FieldError::TimeOutOfRange(time, self.time_count()));
        }
        let spatial = self.spatial_shape()?;
        if !window.fits(spatial) {
            return Err(FieldError::WindowOutOfRange(*window, spatial));
        }
        Ok(())
    }

    /// All depth levels at `time` inside `window`, as (depth, y, x).
    pub fn layers(&self, time: usize, window: &Window) -> Result<MaskedField<Ix3>, FieldError> {
        self.check_time_and_window(time, window)?;
        let (r0, r1, c0, c1) = (
            window.row_start,
            window.row_end,
            window.col_start,
            window.col_end,
        );
        let (values, valid): (Array3<f64>, Array3<bool>) = match self.ndim() {
            3 => {
                let values = self.values.view().into_dimensionality::<Ix3>()?;
                let valid = self.valid.view().into_dimensionality::<Ix3>()?;
                (
                    values.slice(s![time..time + 1, r0..r1, c0..c1]).to_owned(),
                    valid.slice(s![time..time + 1, r0..r1, c0..c1]).to_owned(),
                )
            }
            _ => {
                let values = self.values.view().into_dimensionality::<Ix4>()?;
                let valid = self.valid.view().into_dimensionality::<Ix4>()?;
                (
                    values.slice(s![time, .., r0..r1, c0..c1]).to_owned(),
                    valid.slice(s![time, .., r0..r1, c0..c1]).to_owned(),
                )
            }
        };
        Ok(MaskedField {
            values,
            valid,
            fill_value: self.fill_value,
        })
    }

    /// A single depth level at `time` inside `window`, as (1, y, x).
    pub fn level(
        &self,
        time: usize,
        level: usize,
        window: &Window,
    ) -> Result<MaskedField<Ix3>, FieldError> {
        let depth_count = self.depth_count()?;
        if level >= depth_count {
            return Err(FieldError::LevelOutOfRange(level, depth_count));
        }
        let layers = self.layers(time, window)?;
        Ok(MaskedField {
            values: layers.values.slice(s![level..level + 1, .., ..]).to_owned(),
            valid: layers.valid.slice(s![level..level + 1, .., ..]).to_owned(),
            fill_value: layers.fill_value,
        })
    }
}

impl MaskedField<Ix2> {
    /// One column of a (position, depth) section.
    pub fn column(&self, index: usize) -> MaskedField<Ix1> {
        MaskedField {
            values: self.values.column(index).to_owned(),
            valid: self.valid.column(index).to_owned(),
            fill_value: self.fill_value,
        }
    }
}

impl MaskedField<Ix3> {
    /// Deepest valid value of each water column, as (1, y, x).
    pub fn bottom(&self) -> MaskedField<Ix3> {
        let (depth, rows, cols) = self.values.dim();
        let mut bottom = MaskedField::masked((1, rows, cols)).with_fill_value(self.fill_value);
        for r in 0..rows {
            for c in 0..cols {
                let deepest = (0..depth).rev().find(|&d| self.valid[[d, r, c]]);
                if let Some(d) = deepest {
                    bottom.set([0, r, c], Some(self.values[[d, r, c]]));
                }
            }
        }
        bottom
    }

    /// Depth of the deepest valid level of each water column, as (1, y, x),
    /// with `levels` giving the depth of every level.
    pub fn bottom_depths(&self, levels: &[f64]) -> Result<MaskedField<Ix3>, FieldError> {
        let (depth, rows, cols) = self.values.dim();
        if levels.len() != depth {
            return Err(FieldError::DepthLevelsMismatch(levels.len(), depth));
        }
        let mut depths = MaskedField::masked((1, rows, cols)).with_fill_value(self.fill_value);
        for r in 0..rows {
            for c in 0..cols {
                if let Some(d) = (0..depth).rev().find(|&d| self.valid[[d, r, c]]) {
                    depths.set([0, r, c], Some(levels[d]));
                }
            }
        }
        Ok(depths)
    }
}

#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Value shape {0:?} does not match validity shape {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),
    #[error("Fields must be (time, y, x) or (time, depth, y, x), but got {0} dimensions")]
    WrongRank(usize),
    #[error("Time index {0} is out of range for {1} time steps")]
    TimeOutOfRange(usize, usize),
    #[error("Depth level {0} is out of range for {1} levels")]
    LevelOutOfRange(usize, usize),
    #[error("Got {0} level depths for a field with {1} levels")]
    DepthLevelsMismatch(usize, usize),
    #[error("Window {0:?} does not fit a grid of shape {1:?}")]
    WindowOutOfRange(Window, (usize, usize)),
    #[error(transparent)]
    NDArrayShapeError(#[from] ShapeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array4, ArrayD};

    #[test]
    fn test_from_values_masks_non_finite() {
        let values = Array2::from_shape_vec((2, 2), vec![1.0, f64::NAN, 3.0, f64::INFINITY]).unwrap();
        let field = MaskedField::from_values(values);
        assert_eq!(field.count_invalid(), 2);
        assert_eq!(field.get([0, 0]), Some(1.0));
        assert_eq!(field.get([0, 1]), None);
        assert_eq!(field.values()[[0, 1]], DEFAULT_FILL_VALUE);
    }

    #[test]
    fn test_new_rejects_mismatched_mask() {
        let values = Array2::<f64>::zeros((2, 3));
        let valid = Array2::from_elem((3, 2), true);
        assert!(MaskedField::new(values, valid).is_err());
    }

    #[test]
    fn test_with_fill_value_rewrites_invalid() {
        let values = Array2::from_shape_vec((1, 2), vec![1.0, f64::NAN]).unwrap();
        let field = MaskedField::from_values(values).with_fill_value(-999.0);
        assert_eq!(field.values()[[0, 1]], -999.0);
        assert_eq!(field.fill_value(), -999.0);
    }

    #[test]
    fn test_layers_of_four_dimensional_field() {
        let values = Array4::from_shape_fn((2, 3, 4, 5), |(t, d, y, x)| {
            (t * 1000 + d * 100 + y * 10 + x) as f64
        });
        let field = MaskedField::from_values(values.into_dyn());
        let window = Window {
            row_start: 1,
            row_end: 3,
            col_start: 2,
            col_end: 5,
        };
        let layers = field.layers(1, &window).unwrap();
        assert_eq!(layers.shape(), &[3, 2, 3]);
        assert_eq!(layers.get([2, 0, 0]), Some(1212.0));

        let level = field.level(0, 2, &window).unwrap();
        assert_eq!(level.shape(), &[1, 2, 3]);
        assert_eq!(level.get([0, 1, 2]), Some(224.0));
    }

    #[test]
    fn test_layers_of_surface_field() {
        let values = ArrayD::from_shape_fn(IxDyn(&[2, 3, 3]), |idx| (idx[0] * 10 + idx[1]) as f64);
        let field = MaskedField::from_values(values);
        assert_eq!(field.depth_count().unwrap(), 1);
        let layers = field.layers(1, &Window::full((3, 3))).unwrap();
        assert_eq!(layers.shape(), &[1, 3, 3]);
        assert_eq!(layers.get([0, 2, 0]), Some(12.0));
    }

    #[test]
    fn test_out_of_range_requests() {
        let field = MaskedField::from_values(ArrayD::<f64>::zeros(IxDyn(&[1, 2, 3, 3])));
        let window = Window::full((3, 3));
        assert!(matches!(
            field.layers(1, &window),
            Err(FieldError::TimeOutOfRange(1, 1))
        ));
        assert!(matches!(
            field.level(0, 2, &window),
            Err(FieldError::LevelOutOfRange(2, 2))
        ));
        let too_big = Window::full((4, 3));
        assert!(matches!(
            field.layers(0, &too_big),
            Err(FieldError::WindowOutOfRange(_, _))
        ));
    }

    #[test]
    fn test_column_keeps_mask_and_fill() {
        let values = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0]).unwrap();
        let column = MaskedField::from_values(values).with_fill_value(-1.0).column(0);
        assert_eq!(column.shape(), &[3]);
        assert_eq!(column.get(0), Some(1.0));
        assert_eq!(column.get(1), None);
        assert_eq!(column.values()[1], -1.0);
    }

    #[test]
    fn test_bottom_picks_deepest_valid_level() {
        let mut values = Array3::from_shape_fn((3, 1, 2), |(d, _, x)| (d * 10 + x) as f64);
        values[[2, 0, 0]] = f64::NAN;
        values[[1, 0, 1]] = f64::NAN;
        values[[2, 0, 1]] = f64::NAN;
        let bottom = MaskedField::from_values(values).bottom();
        assert_eq!(bottom.get([0, 0, 0]), Some(10.0));
        assert_eq!(bottom.get([0, 0, 1]), Some(1.0));
    }

    #[test]
    fn test_bottom_depths_follow_deepest_valid_level() {
        let mut values = Array3::from_shape_fn((3, 1, 3), |(d, _, x)| (d * 10 + x) as f64);
        values[[2, 0, 0]] = f64::NAN;
        values[[1, 0, 1]] = f64::NAN;
        values[[2, 0, 1]] = f64::NAN;
        for d in 0..3 {
            values[[d, 0, 2]] = f64::NAN;
        }
        let field = MaskedField::from_values(values);
        let depths = field.bottom_depths(&[5.0, 15.0, 30.0]).unwrap();
        assert_eq!(depths.get([0, 0, 0]), Some(15.0));
        assert_eq!(depths.get([0, 0, 1]), Some(5.0));
        assert_eq!(depths.get([0, 0, 2]), None);
        assert!(matches!(
            field.bottom_depths(&[5.0, 15.0]),
            Err(FieldError::DepthLevelsMismatch(2, 3))
        ));
    }
}
