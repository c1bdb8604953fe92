// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Rust types for the ASN.1 structures CAdES attributes are made of.

Modules are named after the document defining the structures they hold.
*/

pub mod adobe;
pub mod common;
pub mod etsi_en319122;
pub mod rfc2634;
pub mod rfc3161;
pub mod rfc3280;
pub mod rfc5035;
pub mod rfc5126;
pub mod rfc5280;
pub mod rfc5652;
pub mod rfc6960;
