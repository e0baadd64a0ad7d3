// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod argon2_cost_helper {
    use argon2::Params;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Cost parameters of [argon2::Params]. `keyid` and `data` are legacy
    /// fields of the argon2 standard and are never written.
    #[derive(Serialize, Deserialize)]
    struct CostParams {
        m_cost: u32,
        t_cost: u32,
        p_cost: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_len: Option<usize>,
    }

    pub fn serialize<S: Serializer>(params: &Params, serializer: S) -> Result<S::Ok, S::Error> {
        CostParams {
            m_cost: params.m_cost(),
            t_cost: params.t_cost(),
            p_cost: params.p_cost(),
            output_len: params.output_len(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Params, D::Error> {
        let raw = CostParams::deserialize(deserializer)?;
        Params::new(raw.m_cost, raw.t_cost, raw.p_cost, raw.output_len)
            .map_err(serde::de::Error::custom)
    }
}

pub(crate) mod argon2_algorithm_name {
    use argon2::Algorithm;
    use serde::{Deserialize, Deserializer, Serializer};

    // stored by its PHC identifier, i.e. "argon2id"
    pub fn serialize<S: Serializer>(
        algorithm: &Algorithm,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(algorithm.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Algorithm, D::Error> {
        let name = String::deserialize(deserializer)?;
        Algorithm::new(&name).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod argon2_version_number {
    use argon2::Version;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(version: &Version, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(*version as u32)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Version, D::Error> {
        let raw = u32::deserialize(deserializer)?;
        Version::try_from(raw).map_err(serde::de::Error::custom)
    }
}
