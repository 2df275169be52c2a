// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session storage and upload handling.

pub mod session_store;
pub mod upload;

pub use session_store::SessionStore;
pub use upload::spool_uploads;
