//! Data access used by the mutating operations.
//!
//! Each trait is implemented for [`mongodb::Database`] by delegating to
//! `entity_api`, so handlers pass `app_state.db_ref()` unchanged.

use async_trait::async_trait;
use entity::instructors::{self, Schedule};
use entity::slot_status::SlotStatus;
use entity::{certificates, schedule_slots, ticket_classes, Id};
use entity_api::error::Error;
use entity_api::{certificate, instructor, ticket_class};
use mongodb::Database;

#[async_trait]
pub trait InstructorStore: Send + Sync {
    async fn find_instructor(&self, id: Id) -> Result<instructors::Model, Error>;

    /// Appends `slot` if the instructor is still at `expected_version`.
    /// Returns `false` when another write got there first.
    async fn push_slot(
        &self,
        instructor_id: Id,
        expected_version: i64,
        schedule: Schedule,
        slot: &schedule_slots::Model,
    ) -> Result<bool, Error>;

    /// Moves a lesson from `from` to `to`. `None` when the lesson is not in
    /// status `from` anymore.
    async fn update_lesson_status(
        &self,
        instructor_id: Id,
        lesson_id: Id,
        from: SlotStatus,
        to: SlotStatus,
    ) -> Result<Option<instructors::Model>, Error>;
}

#[async_trait]
pub trait TicketClassStore: Send + Sync {
    async fn find_ticket_class(&self, id: Id) -> Result<ticket_classes::Model, Error>;

    /// Enrolls the student if their request is pending and a spot is free.
    /// `None` when either guard failed at write time.
    async fn accept_request(
        &self,
        ticket_class_id: Id,
        student_id: Id,
    ) -> Result<Option<ticket_classes::Model>, Error>;

    async fn reject_request(
        &self,
        ticket_class_id: Id,
        student_id: Id,
    ) -> Result<Option<ticket_classes::Model>, Error>;
}

#[async_trait]
pub trait CertificateStore: Send + Sync {
    async fn max_certificate_number(&self) -> Result<Option<i64>, Error>;

    /// Fails with `DuplicateKey` when the student already holds a
    /// certificate for the class.
    async fn insert_certificate(
        &self,
        model: certificates::Model,
    ) -> Result<certificates::Model, Error>;

    async fn find_certificates(&self, student_id: Id) -> Result<Vec<certificates::Model>, Error>;
}

#[async_trait]
impl InstructorStore for Database {
    async fn find_instructor(&self, id: Id) -> Result<instructors::Model, Error> {
        instructor::find_by_id(self, id).await
    }

    async fn push_slot(
        &self,
        instructor_id: Id,
        expected_version: i64,
        schedule: Schedule,
        slot: &schedule_slots::Model,
    ) -> Result<bool, Error> {
        instructor::push_slot(self, instructor_id, expected_version, schedule, slot).await
    }

    async fn update_lesson_status(
        &self,
        instructor_id: Id,
        lesson_id: Id,
        from: SlotStatus,
        to: SlotStatus,
    ) -> Result<Option<instructors::Model>, Error> {
        instructor::update_lesson_status(self, instructor_id, lesson_id, from, to).await
    }
}

#[async_trait]
impl TicketClassStore for Database {
    async fn find_ticket_class(&self, id: Id) -> Result<ticket_classes::Model, Error> {
        ticket_class::find_by_id(self, id).await
    }

    async fn accept_request(
        &self,
        ticket_class_id: Id,
        student_id: Id,
    ) -> Result<Option<ticket_classes::Model>, Error> {
        ticket_class::accept_request(self, ticket_class_id, student_id).await
    }

    async fn reject_request(
        &self,
        ticket_class_id: Id,
        student_id: Id,
    ) -> Result<Option<ticket_classes::Model>, Error> {
        ticket_class::reject_request(self, ticket_class_id, student_id).await
    }
}

#[async_trait]
impl CertificateStore for Database {
    async fn max_certificate_number(&self) -> Result<Option<i64>, Error> {
        certificate::max_number(self).await
    }

    async fn insert_certificate(
        &self,
        model: certificates::Model,
    ) -> Result<certificates::Model, Error> {
        certificate::create(self, model).await
    }

    async fn find_certificates(&self, student_id: Id) -> Result<Vec<certificates::Model>, Error> {
        certificate::find_by_student(self, student_id).await
    }
}
