//! Alias corrections applied to freshly fetched catalog records.
//!
//! The catalog associates every image of a product "family" with every
//! upstream image of that family. The table below replaces the aliases of the
//! affected repositories with the single upstream image each one actually
//! replaces. An empty entry removes all aliases.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::CatalogError;
use crate::model::RepoRecord;

/// Table of repository name to replacement aliases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AliasCorrections {
    table: HashMap<String, Vec<String>>,
}

impl AliasCorrections {
    pub fn new(table: HashMap<String, Vec<String>>) -> Self {
        Self { table }
    }

    /// A table that corrects nothing.
    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    /// The corrections shipped with the tool.
    pub fn builtin() -> Self {
        let table = BUILTIN
            .iter()
            .map(|(name, aliases)| {
                (
                    name.to_string(),
                    aliases.iter().map(|alias| alias.to_string()).collect(),
                )
            })
            .collect();

        Self { table }
    }

    /// Load a table from a JSON object of `{"name": ["alias", ...]}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|e| CatalogError::io(path, e))?;

        Ok(serde_json::from_slice(&contents)?)
    }

    /// Replacement aliases for `name`, if the table has an entry for it.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.table.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Replace the aliases of every record named in the table.
    ///
    /// Records without an entry are returned untouched. Applying the same
    /// table twice yields the same records as applying it once.
    pub fn apply(&self, mut records: Vec<RepoRecord>) -> Vec<RepoRecord> {
        for record in &mut records {
            if let Some(aliases) = self.table.get(&record.name) {
                record.aliases.clone_from(aliases);
            }
        }

        records
    }
}

impl Default for AliasCorrections {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN: &[(&str, &[&str])] = &[
    ("argocd-repo-server", &[]),
    ("argocd-repo-server-fips", &[]),
    ("argo-cli", &["quay.io/argoproj/argocli"]),
    ("argo-cli-fips", &["quay.io/argoproj/argocli"]),
    ("argo-events", &["quay.io/argoproj/argo-events"]),
    ("argo-events-fips", &["quay.io/argoproj/argo-events"]),
    ("argo-exec", &["quay.io/argoproj/argoexec"]),
    ("argo-exec-fips", &["quay.io/argoproj/argoexec"]),
    ("argo-workflowcontroller", &["quay.io/argoproj/workflow-controller"]),
    ("argo-workflowcontroller-fips", &["quay.io/argoproj/workflow-controller"]),
    ("crossplane-aws", &["ghcr.io/crossplane-contrib/provider-family-aws"]),
    ("crossplane-aws-cloudformation", &["ghcr.io/crossplane-contrib/provider-aws-cloudformation"]),
    (
        "crossplane-aws-cloudformation-fips",
        &["ghcr.io/crossplane-contrib/provider-aws-cloudformation"],
    ),
    ("crossplane-aws-cloudfront", &["ghcr.io/crossplane-contrib/provider-aws-cloudfront"]),
    ("crossplane-aws-cloudfront-fips", &["ghcr.io/crossplane-contrib/provider-aws-cloudfront"]),
    ("crossplane-aws-cloudwatchlogs", &["ghcr.io/crossplane-contrib/provider-aws-cloudwatchlogs"]),
    (
        "crossplane-aws-cloudwatchlogs-fips",
        &["ghcr.io/crossplane-contrib/provider-aws-cloudwatchlogs"],
    ),
    ("crossplane-aws-dynamodb", &["ghcr.io/crossplane-contrib/provider-aws-dynamodb"]),
    ("crossplane-aws-dynamodb-fips", &["ghcr.io/crossplane-contrib/provider-aws-dynamodb"]),
    ("crossplane-aws-ec2", &["ghcr.io/crossplane-contrib/provider-aws-ec2"]),
    ("crossplane-aws-ec2-fips", &["ghcr.io/crossplane-contrib/provider-aws-ec2"]),
    ("crossplane-aws-eks", &["ghcr.io/crossplane-contrib/provider-aws-eks"]),
    ("crossplane-aws-eks-fips", &["ghcr.io/crossplane-contrib/provider-aws-eks"]),
    ("crossplane-aws-elasticache", &["ghcr.io/crossplane-contrib/provider-aws-elasticache"]),
    ("crossplane-aws-elasticache-fips", &["ghcr.io/crossplane-contrib/provider-aws-elasticache"]),
    ("crossplane-aws-fips", &["ghcr.io/crossplane-contrib/provider-family-aws"]),
    ("crossplane-aws-firehose", &["ghcr.io/crossplane-contrib/provider-aws-firehose"]),
    ("crossplane-aws-firehose-fips", &["ghcr.io/crossplane-contrib/provider-aws-firehose"]),
    ("crossplane-aws-iam", &["ghcr.io/crossplane-contrib/provider-aws-iam"]),
    ("crossplane-aws-iam-fips", &["ghcr.io/crossplane-contrib/provider-aws-iam"]),
    ("crossplane-aws-kinesis", &["ghcr.io/crossplane-contrib/provider-aws-kinesis"]),
    ("crossplane-aws-kinesis-fips", &["ghcr.io/crossplane-contrib/provider-aws-kinesis"]),
    ("crossplane-aws-kms", &["ghcr.io/crossplane-contrib/provider-aws-kms"]),
    ("crossplane-aws-kms-fips", &["ghcr.io/crossplane-contrib/provider-aws-kms"]),
    ("crossplane-aws-lambda", &["ghcr.io/crossplane-contrib/provider-aws-lambda"]),
    ("crossplane-aws-lambda-fips", &["ghcr.io/crossplane-contrib/provider-aws-lambda"]),
    ("crossplane-aws-memorydb", &["ghcr.io/crossplane-contrib/provider-aws-memorydb"]),
    ("crossplane-aws-memorydb-fips", &["ghcr.io/crossplane-contrib/provider-aws-memorydb"]),
    ("crossplane-aws-rds", &["ghcr.io/crossplane-contrib/provider-aws-rds"]),
    ("crossplane-aws-rds-fips", &["ghcr.io/crossplane-contrib/provider-aws-rds"]),
    ("crossplane-aws-route53", &["ghcr.io/crossplane-contrib/provider-aws-route53"]),
    ("crossplane-aws-route53-fips", &["ghcr.io/crossplane-contrib/provider-aws-route53"]),
    ("crossplane-aws-s3", &["ghcr.io/crossplane-contrib/provider-aws-s3"]),
    ("crossplane-aws-s3-fips", &["ghcr.io/crossplane-contrib/provider-aws-s3"]),
    ("crossplane-aws-sns", &["ghcr.io/crossplane-contrib/provider-aws-sns"]),
    ("crossplane-aws-sns-fips", &["ghcr.io/crossplane-contrib/provider-aws-sns"]),
    ("crossplane-aws-sqs", &["ghcr.io/crossplane-contrib/provider-aws-sqs"]),
    ("crossplane-aws-sqs-fips", &["ghcr.io/crossplane-contrib/provider-aws-sqs"]),
    ("cert-manager-acmesolver", &["quay.io/jetstack/cert-manager-acmesolver"]),
    ("cert-manager-acmesolver-fips", &["quay.io/jetstack/cert-manager-acmesolver"]),
    ("cert-manager-acmesolver-iamguarded", &["quay.io/jetstack/cert-manager-acmesolver"]),
    ("cert-manager-acmesolver-iamguarded-fips", &["quay.io/jetstack/cert-manager-acmesolver"]),
    ("cert-manager-cainjector", &["quay.io/jetstack/cert-manager-cainjector"]),
    ("cert-manager-cainjector-fips", &["quay.io/jetstack/cert-manager-cainjector"]),
    ("cert-manager-cainjector-iamguarded", &["quay.io/jetstack/cert-manager-cainjector"]),
    ("cert-manager-cainjector-iamguarded-fips", &["quay.io/jetstack/cert-manager-cainjector"]),
    ("cert-manager-cmctl", &["quay.io/jetstack/cmctl"]),
    ("cert-manager-cmctl-fips", &["quay.io/jetstack/cmctl"]),
    ("cert-manager-webhook", &["quay.io/jetstack/cert-manager-webhook"]),
    ("cert-manager-webhook-fips", &["quay.io/jetstack/cert-manager-webhook"]),
    ("cert-manager-webhook-iamguarded", &["quay.io/jetstack/cert-manager-webhook"]),
    ("cert-manager-webhook-iamguarded-fips", &["quay.io/jetstack/cert-manager-webhook"]),
    ("flux", &["ghcr.io/fluxcd/flux-cli"]),
    ("flux-fips", &["ghcr.io/fluxcd/flux-cli"]),
    ("flux-helm-controller", &["ghcr.io/fluxcd/helm-controller"]),
    ("flux-helm-controller-fips", &["ghcr.io/fluxcd/helm-controller"]),
    ("flux-image-automation-controller", &["ghcr.io/fluxcd/image-automation-controller"]),
    ("flux-image-automation-controller-fips", &["ghcr.io/fluxcd/image-automation-controller"]),
    ("flux-image-reflector-controller", &["ghcr.io/fluxcd/image-reflector-controller"]),
    ("flux-image-reflector-controller-fips", &["ghcr.io/fluxcd/image-reflector-controller"]),
    ("flux-kustomize-controller", &["ghcr.io/fluxcd/kustomize-controller"]),
    ("flux-kustomize-controller-fips", &["ghcr.io/fluxcd/kustomize-controller"]),
    ("flux-notification-controller", &["ghcr.io/fluxcd/notification-controller"]),
    ("flux-notification-controller-fips", &["ghcr.io/fluxcd/notification-controller"]),
    ("flux-source-controller", &["ghcr.io/fluxcd/source-controller"]),
    ("flux-source-controller-fips", &["ghcr.io/fluxcd/source-controller"]),
    ("kyverno-cli", &["ghcr.io/kyverno/kyverno-cli"]),
    ("kyverno-cli-fips", &["ghcr.io/kyverno/kyverno-cli-fips"]),
    ("kyverno", &["ghcr.io/kyverno/kyverno"]),
    ("kyverno-fips", &["ghcr.io/kyverno/kyverno"]),
    ("kyvernopre", &["ghcr.io/kyverno/kyvernopre"]),
    ("kyvernopre-fips", &["ghcr.io/kyverno/kyvernopre"]),
    ("kyverno-background-controller", &["ghcr.io/kyverno/background-controller"]),
    ("kyverno-background-controller-fips", &["ghcr.io/kyverno/background-controller"]),
    ("kyverno-cleanup-controller", &["ghcr.io/kyverno/cleanup-controller"]),
    ("kyverno-cleanup-controller-fips", &["ghcr.io/kyverno/cleanup-controller"]),
    ("kyverno-reports-controller", &["ghcr.io/kyverno/reports-controller"]),
    ("kyverno-reports-controller-fips", &["ghcr.io/kyverno/reports-controller"]),
    ("minio-client", &["quay.io/minio/mc"]),
    ("minio-client-fips", &["quay.io/minio/mc"]),
    ("minio-operator", &["quay.io/minio/operator"]),
    ("minio-operator-fips", &["quay.io/minio/operator"]),
    ("minio-operator-sidecar", &["quay.io/minio/operator-sidecar"]),
    ("minio-operator-sidecar-fips", &["quay.io/minio/operator-sidecar"]),
    (
        "mongodb-kubernetes-operator-readinessprobe",
        &["quay.io/mongodb/mongodb-kubernetes-readinessprobe"],
    ),
    (
        "mongodb-kubernetes-operator-readinessprobe-fips",
        &["quay.io/mongodb/mongodb-kubernetes-readinessprobe"],
    ),
    (
        "mongodb-kubernetes-operator-version-upgrade-post-start-hook",
        &["quay.io/mongodb/mongodb-kubernetes-operator-version-upgrade-post-start-hook"],
    ),
    (
        "mongodb-kubernetes-operator-version-upgrade-post-start-hook-fips",
        &["quay.io/mongodb/mongodb-kubernetes-operator-version-upgrade-post-start-hook"],
    ),
    ("postgres-cloudnative-pg", &["ghcr.io/cloudnative-pg/postgresql"]),
    ("postgres-cloudnative-pg-fips", &["ghcr.io/cloudnative-pg/postgresql"]),
    ("vault-k8s", &["hashicorp/vault-k8s"]),
];
