// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations for the persistence layer.
//!
//! Each mutation is a single statement. Multi-step sequences such as
//! "look up by code, then create" are composed by callers and are not
//! wrapped in a transaction.

pub mod institutes;
