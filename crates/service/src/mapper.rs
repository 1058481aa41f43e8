//! Entity ⇄ DTO translation contracts.

use std::marker::PhantomData;

use crate::errors::ServiceError;

/// Translates between an entity and the DTO shapes of one service.
///
/// `to_entity` and `merge_into_entity` may reject malformed input with
/// `ServiceError::Validation`; the service propagates it unchanged.
pub trait Mapper<E>: Send + Sync {
    type GetOutput: Send;
    type ListOutput: Send;
    type CreateInput: Send;
    type UpdateInput: Send;

    fn to_entity(&self, input: Self::CreateInput) -> Result<E, ServiceError>;

    /// Apply only the fields present in `input`; everything else on `entity`
    /// stays as it was.
    fn merge_into_entity(&self, input: Self::UpdateInput, entity: &mut E) -> Result<(), ServiceError>;

    fn to_get_output(&self, entity: &E) -> Self::GetOutput;

    fn to_list_output(&self, entity: &E) -> Self::ListOutput;
}

/// Mapper for services that use a single DTO in every direction.
pub trait SimpleMapper<E>: Send + Sync {
    type Dto: Send;

    fn to_entity(&self, dto: Self::Dto) -> Result<E, ServiceError>;

    fn merge_into_entity(&self, dto: Self::Dto, entity: &mut E) -> Result<(), ServiceError>;

    fn to_dto(&self, entity: &E) -> Self::Dto;
}

/// Presents a `SimpleMapper` as a full `Mapper`.
pub struct SimpleMapperAdapter<E, M> {
    inner: M,
    _entity: PhantomData<fn() -> E>,
}

impl<E, M> SimpleMapperAdapter<E, M> {
    pub fn new(inner: M) -> Self { Self { inner, _entity: PhantomData } }

    pub fn inner(&self) -> &M { &self.inner }
}

impl<E, M: SimpleMapper<E>> Mapper<E> for SimpleMapperAdapter<E, M> {
    type GetOutput = M::Dto;
    type ListOutput = M::Dto;
    type CreateInput = M::Dto;
    type UpdateInput = M::Dto;

    fn to_entity(&self, input: M::Dto) -> Result<E, ServiceError> { self.inner.to_entity(input) }

    fn merge_into_entity(&self, input: M::Dto, entity: &mut E) -> Result<(), ServiceError> {
        self.inner.merge_into_entity(input, entity)
    }

    fn to_get_output(&self, entity: &E) -> M::Dto { self.inner.to_dto(entity) }

    fn to_list_output(&self, entity: &E) -> M::Dto { self.inner.to_dto(entity) }
}
