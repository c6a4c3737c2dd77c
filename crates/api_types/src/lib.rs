// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

//! # OpenStack resource API types
//!
//! Write-shape request envelopes of the Identity v2, Compute v2 and Block
//! Storage v1 APIs. The read shapes are decoded by the generic attribute
//! mapper of the `openstack_resource` crate, so only what is sent to the
//! services lives here.

pub mod block_storage;
pub mod compute;
pub mod error;
pub mod identity;
