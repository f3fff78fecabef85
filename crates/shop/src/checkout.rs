//! Checkout wizard state machine.
//!
//! Three steps: Address -> Delivery -> Review. Transitions are strictly
//! forward except that the address step may be revisited. The state lives
//! in the session; handlers load it, apply one operation, and store it
//! back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sari_core::{AddressId, PaymentMethod};

/// Wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Address,
    Delivery,
    Review,
}

/// Errors from wizard operations.
///
/// These are all missing-precondition errors: the operation is rejected
/// and the state is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Advancing past the address step without a selected address.
    #[error("Please select a delivery address")]
    AddressRequired,
    /// Advancing past the delivery step without a chosen method.
    #[error("Please choose a delivery method")]
    MethodRequired,
    /// An operation that does not belong to the current step.
    #[error("Not available at this checkout step")]
    WrongStep,
    /// Advancing from the final step.
    #[error("Already at order review")]
    AtFinalStep,
}

/// The wizard state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutState {
    step: CheckoutStep,
    selected_address: Option<AddressId>,
    method: Option<PaymentMethod>,
}

impl CheckoutState {
    /// Fresh wizard at the address step with nothing selected.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            step: CheckoutStep::Address,
            selected_address: None,
            method: None,
        }
    }

    /// The current step.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// The selected address, if any.
    #[must_use]
    pub const fn selected_address(&self) -> Option<AddressId> {
        self.selected_address
    }

    /// The chosen delivery/payment method, if any.
    #[must_use]
    pub const fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    /// Select an address. Purely local; no side effects.
    pub fn select_address(&mut self, id: AddressId) {
        self.selected_address = Some(id);
    }

    /// Choose the delivery/payment method. Only valid at the delivery step.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WrongStep`] outside the delivery step.
    pub fn choose_method(&mut self, method: PaymentMethod) -> Result<(), CheckoutError> {
        match self.step {
            CheckoutStep::Delivery => {
                self.method = Some(method);
                Ok(())
            }
            CheckoutStep::Address | CheckoutStep::Review => Err(CheckoutError::WrongStep),
        }
    }

    /// Advance one step forward.
    ///
    /// # Errors
    ///
    /// Returns the blocking precondition when the current step is not
    /// complete, leaving the state unchanged.
    pub fn advance(&mut self) -> Result<CheckoutStep, CheckoutError> {
        match self.step {
            CheckoutStep::Address => {
                if self.selected_address.is_none() {
                    return Err(CheckoutError::AddressRequired);
                }
                self.step = CheckoutStep::Delivery;
                Ok(self.step)
            }
            CheckoutStep::Delivery => {
                if self.method.is_none() {
                    return Err(CheckoutError::MethodRequired);
                }
                self.step = CheckoutStep::Review;
                Ok(self.step)
            }
            CheckoutStep::Review => Err(CheckoutError::AtFinalStep),
        }
    }

    /// Return to the address step, keeping the selection and method.
    pub fn back_to_address(&mut self) {
        self.step = CheckoutStep::Address;
    }

    /// React to an address being deleted.
    ///
    /// If the deleted address was the selected one, the selection is
    /// cleared and the wizard drops back to the address step so a later
    /// placement cannot reference a dangling address.
    pub fn address_removed(&mut self, id: AddressId) {
        if self.selected_address == Some(id) {
            self.selected_address = None;
            self.step = CheckoutStep::Address;
        }
    }

    /// Whether the wizard is ready for placement.
    #[must_use]
    pub fn ready_to_place(&self) -> bool {
        matches!(self.step, CheckoutStep::Review)
            && self.selected_address.is_some()
            && self.method.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_address_step_with_nothing_selected() {
        let state = CheckoutState::new();
        assert_eq!(state.step(), CheckoutStep::Address);
        assert!(state.selected_address().is_none());
        assert!(state.method().is_none());
    }

    #[test]
    fn cannot_leave_address_step_without_selection() {
        let mut state = CheckoutState::new();
        assert_eq!(state.advance(), Err(CheckoutError::AddressRequired));
        assert_eq!(state.step(), CheckoutStep::Address);
    }

    #[test]
    fn full_forward_walk() {
        let mut state = CheckoutState::new();
        state.select_address(AddressId::generate());
        assert_eq!(state.advance(), Ok(CheckoutStep::Delivery));

        assert_eq!(state.advance(), Err(CheckoutError::MethodRequired));
        state
            .choose_method(PaymentMethod::EWallet)
            .expect("at delivery step");
        assert_eq!(state.advance(), Ok(CheckoutStep::Review));
        assert!(state.ready_to_place());

        assert_eq!(state.advance(), Err(CheckoutError::AtFinalStep));
    }

    #[test]
    fn method_choice_is_rejected_outside_delivery_step() {
        let mut state = CheckoutState::new();
        assert_eq!(
            state.choose_method(PaymentMethod::Points),
            Err(CheckoutError::WrongStep)
        );
    }

    #[test]
    fn address_step_can_be_revisited() {
        let mut state = CheckoutState::new();
        let id = AddressId::generate();
        state.select_address(id);
        state.advance().expect("to delivery");

        state.back_to_address();
        assert_eq!(state.step(), CheckoutStep::Address);
        // Selection and method survive the detour.
        assert_eq!(state.selected_address(), Some(id));
    }

    #[test]
    fn removing_the_selected_address_clears_the_selection() {
        let mut state = CheckoutState::new();
        let id = AddressId::generate();
        state.select_address(id);
        state.advance().expect("to delivery");

        state.address_removed(id);
        assert!(state.selected_address().is_none());
        assert_eq!(state.step(), CheckoutStep::Address);
    }

    #[test]
    fn removing_another_address_leaves_the_selection_alone() {
        let mut state = CheckoutState::new();
        let kept = AddressId::generate();
        state.select_address(kept);

        state.address_removed(AddressId::generate());
        assert_eq!(state.selected_address(), Some(kept));
    }

    #[test]
    fn later_selection_replaces_earlier_one() {
        let mut state = CheckoutState::new();
        state.select_address(AddressId::generate());
        let second = AddressId::generate();
        state.select_address(second);
        assert_eq!(state.selected_address(), Some(second));
    }
}
