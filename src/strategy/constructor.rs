use alloc::vec::Vec;
use core::fmt::{self, Debug, Formatter};

use super::{DependencyInfo, ExportKey, MemberKind};
use crate::{
    any::TypeInfo,
    dependency_resolver::DependencyResolver,
    instantiator::{boxed_instantiator_factory, BoxedCloneInstantiator, Instantiator},
};

/// Policy picking one of several constructors of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstructorSelection {
    MostParameters,
    LeastParameters,
    /// Constructor with the most parameters whose required dependencies are all locatable.
    #[default]
    BestMatch,
}

impl ConstructorSelection {
    /// Returns the index of the selected constructor.
    ///
    /// A single constructor is always selected, its missing dependencies fail at activation.
    ///
    /// # Errors
    /// Returns the missing dependencies of the widest constructor if no constructor is resolvable.
    pub(crate) fn select(
        self,
        constructors: &[Constructor],
        mut can_locate: impl FnMut(&DependencyInfo) -> bool,
    ) -> Result<usize, Vec<ExportKey>> {
        if constructors.len() <= 1 {
            return Ok(0);
        }

        let mut by_width = (0..constructors.len()).collect::<Vec<_>>();
        by_width.sort_by_key(|&index| core::cmp::Reverse(constructors[index].dependencies.len()));

        match self {
            Self::MostParameters => Ok(by_width[0]),
            Self::LeastParameters => Ok(by_width[by_width.len() - 1]),
            Self::BestMatch => {
                for &index in &by_width {
                    let resolvable = constructors[index]
                        .dependencies
                        .iter()
                        .filter(|dependency| dependency.is_required())
                        .all(&mut can_locate);
                    if resolvable {
                        return Ok(index);
                    }
                }
                Err(constructors[by_width[0]]
                    .dependencies
                    .iter()
                    .filter(|dependency| dependency.is_required() && !can_locate(dependency))
                    .map(|dependency| dependency.requested.clone())
                    .collect())
            }
        }
    }
}

/// One way to instantiate the activation type, with its declared parameters.
#[derive(Clone)]
pub struct Constructor {
    pub(crate) dependencies: Vec<DependencyInfo>,
    pub(crate) build: BoxedCloneInstantiator,
    pub(crate) provides: TypeInfo,
}

impl Constructor {
    #[must_use]
    pub fn new<Inst, Deps>(instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver,
    {
        let mut dependencies = Vec::new();
        Deps::dependencies(&mut dependencies);

        Self {
            dependencies: dependencies
                .into_iter()
                .enumerate()
                .map(|(index, dependency)| dependency.at(MemberKind::Constructor(index)))
                .collect(),
            build: boxed_instantiator_factory(instantiator),
            provides: TypeInfo::of::<Inst::Provides>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[DependencyInfo] {
        &self.dependencies
    }

    #[inline]
    pub(crate) fn dependency_mut(&mut self, index: usize) -> Option<&mut DependencyInfo> {
        self.dependencies.get_mut(index)
    }

    #[inline]
    #[must_use]
    pub const fn provides(&self) -> TypeInfo {
        self.provides
    }
}

impl Debug for Constructor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("provides", &self.provides.name)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{Constructor, ConstructorSelection};
    use crate::{
        errors::InstantiateErrorKind,
        inject::{Inject, InjectOptional},
        strategy::ExportKey,
    };

    use alloc::vec;

    struct Service;

    fn constructors() -> alloc::vec::Vec<Constructor> {
        vec![
            Constructor::new(|| Ok::<_, InstantiateErrorKind>(Service)),
            Constructor::new(|Inject(_): Inject<u8>, Inject(_): Inject<u16>| Ok::<_, InstantiateErrorKind>(Service)),
            Constructor::new(|Inject(_): Inject<u8>, InjectOptional(_): InjectOptional<u32>| {
                Ok::<_, InstantiateErrorKind>(Service)
            }),
        ]
    }

    #[test]
    fn test_fixed_policies() {
        let constructors = constructors();

        assert_eq!(ConstructorSelection::MostParameters.select(&constructors, |_| false), Ok(1));
        assert_eq!(ConstructorSelection::LeastParameters.select(&constructors, |_| false), Ok(0));
    }

    #[test]
    fn test_best_match_skips_unresolvable() {
        let constructors = constructors();
        let only_u8 = |dependency: &crate::strategy::DependencyInfo| *dependency.requested() == ExportKey::of::<u8>();

        assert_eq!(ConstructorSelection::BestMatch.select(&constructors, |_| true), Ok(1));
        assert_eq!(ConstructorSelection::BestMatch.select(&constructors, only_u8), Ok(2));
        assert_eq!(ConstructorSelection::BestMatch.select(&constructors, |_| false), Ok(0));
    }

    #[test]
    fn test_best_match_reports_missing() {
        let constructors = vec![
            Constructor::new(|Inject(_): Inject<u8>| Ok::<_, InstantiateErrorKind>(Service)),
            Constructor::new(|Inject(_): Inject<u8>, Inject(_): Inject<u16>| Ok::<_, InstantiateErrorKind>(Service)),
        ];

        assert_eq!(
            ConstructorSelection::BestMatch.select(&constructors, |_| false),
            Err(vec![ExportKey::of::<u8>(), ExportKey::of::<u16>()])
        );
    }
}
